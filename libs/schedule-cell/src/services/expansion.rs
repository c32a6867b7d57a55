// libs/schedule-cell/src/services/expansion.rs
use chrono::{Datelike, NaiveDate};

use shared_models::DayOfWeek;
use timeslot_cell::models::TimeSlot;

use crate::interval::Interval;
use crate::models::ExpandedInterval;

/// Materializes a weekly slot into its concrete UTC occurrences on the
/// inclusive date window `[window_start, window_end]`. A slot whose duration
/// runs past midnight emits the single cross-midnight interval unchanged,
/// even when the tail leaves the window. Advance notice plays no part here;
/// it constrains booking creation, not availability display.
pub fn expand_slot(
    slot: &TimeSlot,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<ExpandedInterval> {
    if !slot.is_active || window_end < window_start {
        return vec![];
    }

    let mut occurrences = Vec::new();
    let mut date = window_start;

    while date <= window_end {
        if DayOfWeek::from(date.weekday()) == slot.day_of_week {
            let (start, end) = slot.occurrence_on(date);
            if let Some(interval) = Interval::new(start, end) {
                occurrences.push(ExpandedInterval {
                    interval,
                    time_slot_id: slot.id.clone(),
                });
            }
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    occurrences
}
