// libs/schedule-cell/src/services/blocks.rs
use std::collections::HashMap;

use chrono::Duration;

use booking_cell::models::{Booking, BookingState};
use shared_models::{TherapistId, TimeSlotId, MIN_AFTER_SESSION_BREAK_MINUTES};
use timeslot_cell::models::TimeSlot;

use crate::interval::{merge, Interval};

/// Turns non-cancelled bookings into per-therapist blocked time. Each booking
/// blocks `[start - advance_notice, end + after_session_break)` of its slot,
/// with the break never below the enforced minimum. The per-therapist lists
/// come back sorted and pairwise disjoint.
pub fn booking_blocks(
    bookings: &[Booking],
    slots_by_id: &HashMap<TimeSlotId, TimeSlot>,
) -> HashMap<TherapistId, Vec<Interval>> {
    let mut raw: HashMap<TherapistId, Vec<Interval>> = HashMap::new();

    for booking in bookings {
        if booking.state == BookingState::Cancelled {
            continue;
        }

        let (pre, post) = match slots_by_id.get(&booking.time_slot_id) {
            Some(slot) => (slot.advance_notice_minutes, slot.effective_break_minutes()),
            None => (0, MIN_AFTER_SESSION_BREAK_MINUTES),
        };

        let start = booking.start_time - Duration::minutes(pre as i64);
        let end = booking.end_time() + Duration::minutes(post as i64);
        if let Some(interval) = Interval::new(start, end) {
            raw.entry(booking.therapist_id.clone()).or_default().push(interval);
        }
    }

    raw.into_iter()
        .map(|(therapist_id, intervals)| (therapist_id, merge(intervals)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use shared_models::{BookingId, ClientId, DayOfWeek, TimezoneOffset};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 12, hour, min, 0).unwrap()
    }

    fn slot(advance_notice: i32, break_minutes: i32) -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            therapist_id: TherapistId::new(),
            is_active: true,
            day_of_week: DayOfWeek::Friday,
            start: "09:00".parse().unwrap(),
            duration_minutes: 480,
            advance_notice_minutes: advance_notice,
            after_session_break_minutes: break_minutes,
            timezone_offset: TimezoneOffset::UTC,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn booking(
        slot: &TimeSlot,
        state: BookingState,
        start: DateTime<Utc>,
        duration: i32,
    ) -> Booking {
        Booking {
            id: BookingId::new(),
            time_slot_id: slot.id.clone(),
            therapist_id: slot.therapist_id.clone(),
            client_id: ClientId::new(),
            start_time: start,
            duration_minutes: duration,
            client_timezone_offset: TimezoneOffset::UTC,
            state,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn slot_map(slots: &[&TimeSlot]) -> HashMap<TimeSlotId, TimeSlot> {
        slots.iter().map(|s| (s.id.clone(), (*s).clone())).collect()
    }

    #[test]
    fn confirmed_booking_blocks_session_plus_break() {
        let slot = slot(0, 15);
        let bookings = vec![booking(&slot, BookingState::Confirmed, at(11, 0), 60)];

        let blocks = booking_blocks(&bookings, &slot_map(&[&slot]));
        let therapist_blocks = &blocks[&slot.therapist_id];

        assert_eq!(therapist_blocks, &vec![Interval::new(at(11, 0), at(12, 15)).unwrap()]);
    }

    #[test]
    fn advance_notice_extends_the_block_backwards() {
        let slot = slot(30, 15);
        let bookings = vec![booking(&slot, BookingState::Pending, at(11, 0), 60)];

        let blocks = booking_blocks(&bookings, &slot_map(&[&slot]));
        let therapist_blocks = &blocks[&slot.therapist_id];

        assert_eq!(therapist_blocks, &vec![Interval::new(at(10, 30), at(12, 15)).unwrap()]);
    }

    #[test]
    fn zero_break_is_raised_to_the_minimum() {
        let slot = slot(0, 0);
        let bookings = vec![booking(&slot, BookingState::Confirmed, at(11, 0), 60)];

        let blocks = booking_blocks(&bookings, &slot_map(&[&slot]));
        let therapist_blocks = &blocks[&slot.therapist_id];

        assert_eq!(therapist_blocks[0].end, at(12, 15));
    }

    #[test]
    fn cancelled_bookings_block_nothing() {
        let slot = slot(0, 15);
        let bookings = vec![booking(&slot, BookingState::Cancelled, at(11, 0), 60)];

        assert!(booking_blocks(&bookings, &slot_map(&[&slot])).is_empty());
    }

    #[test]
    fn adjacent_blocks_merge_per_therapist() {
        let slot = slot(0, 15);
        let bookings = vec![
            booking(&slot, BookingState::Confirmed, at(11, 0), 60),
            booking(&slot, BookingState::Confirmed, at(12, 15), 60),
        ];

        let blocks = booking_blocks(&bookings, &slot_map(&[&slot]));
        let therapist_blocks = &blocks[&slot.therapist_id];

        assert_eq!(therapist_blocks, &vec![Interval::new(at(11, 0), at(13, 30)).unwrap()]);
    }

    #[test]
    fn therapists_are_blocked_independently() {
        let first = slot(0, 15);
        let second = slot(0, 15);
        let bookings = vec![
            booking(&first, BookingState::Confirmed, at(11, 0), 60),
            booking(&second, BookingState::Confirmed, at(14, 0), 60),
        ];

        let blocks = booking_blocks(&bookings, &slot_map(&[&first, &second]));

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[&first.therapist_id][0].start, at(11, 0));
        assert_eq!(blocks[&second.therapist_id][0].start, at(14, 0));
    }
}
