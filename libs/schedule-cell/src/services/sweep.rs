// libs/schedule-cell/src/services/sweep.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use shared_models::{TherapistId, TimeSlotId};

use crate::interval::Interval;
use crate::models::ExpandedInterval;

/// A maximal segment with a constant set of free therapists, each mapped to
/// the slot carrying them through the segment. `BTreeMap` keeps the snapshot
/// ordered by therapist id, so serialization is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSegment {
    pub interval: Interval,
    pub active: BTreeMap<TherapistId, TimeSlotId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    // Leave sorts before Enter, so an interval ending at `t` and another
    // starting at `t` never count as overlapping.
    Leave,
    Enter,
}

/// Sweep-line over every therapist's free intervals. Boundaries exist exactly
/// where set membership changes, so equal adjacent snapshots cannot arise and
/// no coalescing pass is needed.
pub fn sweep(free_by_therapist: &BTreeMap<TherapistId, Vec<ExpandedInterval>>) -> Vec<SweepSegment> {
    let mut events: Vec<(DateTime<Utc>, EventKind, &TherapistId, &TimeSlotId)> = Vec::new();

    for (therapist_id, intervals) in free_by_therapist {
        for free in intervals {
            events.push((free.interval.start, EventKind::Enter, therapist_id, &free.time_slot_id));
            events.push((free.interval.end, EventKind::Leave, therapist_id, &free.time_slot_id));
        }
    }

    events.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut segments = Vec::new();
    let mut active: BTreeMap<TherapistId, TimeSlotId> = BTreeMap::new();
    let mut previous: Option<DateTime<Utc>> = None;

    let mut index = 0;
    while index < events.len() {
        let instant = events[index].0;

        if let Some(start) = previous {
            if !active.is_empty() && instant > start {
                segments.push(SweepSegment {
                    interval: Interval { start, end: instant },
                    active: active.clone(),
                });
            }
        }

        // Apply every event at this instant, leaves first.
        while index < events.len() && events[index].0 == instant {
            let (_, kind, therapist_id, slot_id) = events[index];
            match kind {
                EventKind::Leave => {
                    active.remove(therapist_id);
                }
                EventKind::Enter => {
                    active.insert(therapist_id.clone(), slot_id.clone());
                }
            }
            index += 1;
        }

        previous = Some(instant);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, hour, min, 0).unwrap()
    }

    fn free(start: (u32, u32), end: (u32, u32), slot: &TimeSlotId) -> ExpandedInterval {
        ExpandedInterval {
            interval: Interval::new(at(start.0, start.1), at(end.0, end.1)).unwrap(),
            time_slot_id: slot.clone(),
        }
    }

    fn therapist(n: u8) -> TherapistId {
        TherapistId::from_string(format!("therapist_{n:032}"))
    }

    #[test]
    fn three_therapists_produce_membership_change_boundaries() {
        let (a, b, c) = (therapist(1), therapist(2), therapist(3));
        let (slot_a, slot_b, slot_c) = (TimeSlotId::new(), TimeSlotId::new(), TimeSlotId::new());

        let mut input = BTreeMap::new();
        input.insert(a.clone(), vec![free((9, 0), (11, 0), &slot_a)]);
        input.insert(b.clone(), vec![free((9, 15), (10, 45), &slot_b)]);
        input.insert(c.clone(), vec![free((9, 15), (10, 0), &slot_c)]);

        let segments = sweep(&input);

        let memberships: Vec<(Interval, Vec<&TherapistId>)> = segments
            .iter()
            .map(|s| (s.interval, s.active.keys().collect()))
            .collect();

        assert_eq!(
            memberships,
            vec![
                (Interval::new(at(9, 0), at(9, 15)).unwrap(), vec![&a]),
                (Interval::new(at(9, 15), at(10, 0)).unwrap(), vec![&a, &b, &c]),
                (Interval::new(at(10, 0), at(10, 45)).unwrap(), vec![&a, &b]),
                (Interval::new(at(10, 45), at(11, 0)).unwrap(), vec![&a]),
            ]
        );
    }

    #[test]
    fn touching_intervals_stay_adjacent_ranges() {
        let (a, b) = (therapist(1), therapist(2));
        let (slot_a, slot_b) = (TimeSlotId::new(), TimeSlotId::new());

        let mut input = BTreeMap::new();
        input.insert(a.clone(), vec![free((9, 0), (10, 0), &slot_a)]);
        input.insert(b.clone(), vec![free((10, 0), (11, 0), &slot_b)]);

        let segments = sweep(&input);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].interval, Interval::new(at(9, 0), at(10, 0)).unwrap());
        assert_eq!(segments[0].active.keys().collect::<Vec<_>>(), vec![&a]);
        // The shared instant belongs to the second range.
        assert_eq!(segments[1].interval, Interval::new(at(10, 0), at(11, 0)).unwrap());
        assert_eq!(segments[1].active.keys().collect::<Vec<_>>(), vec![&b]);
    }

    #[test]
    fn gaps_with_no_free_therapist_emit_nothing() {
        let a = therapist(1);
        let slot_a = TimeSlotId::new();

        let mut input = BTreeMap::new();
        input.insert(a.clone(), vec![free((9, 0), (10, 0), &slot_a), free((14, 0), (15, 0), &slot_a)]);

        let segments = sweep(&input);

        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| !s.active.is_empty()));
        assert_eq!(segments[0].interval.end, at(10, 0));
        assert_eq!(segments[1].interval.start, at(14, 0));
    }

    #[test]
    fn output_is_disjoint_and_sorted() {
        let (a, b) = (therapist(1), therapist(2));
        let (slot_a, slot_b) = (TimeSlotId::new(), TimeSlotId::new());

        let mut input = BTreeMap::new();
        input.insert(a, vec![free((14, 30), (16, 0), &slot_a)]);
        input.insert(b, vec![free((15, 0), (17, 0), &slot_b)]);

        let segments = sweep(&input);

        for pair in segments.windows(2) {
            assert!(pair[0].interval.end <= pair[1].interval.start);
        }
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn snapshot_keeps_the_carrying_slot_per_therapist() {
        let a = therapist(1);
        let slot_morning = TimeSlotId::new();
        let slot_evening = TimeSlotId::new();

        let mut input = BTreeMap::new();
        input.insert(
            a.clone(),
            vec![free((9, 0), (10, 0), &slot_morning), free((18, 0), (19, 0), &slot_evening)],
        );

        let segments = sweep(&input);

        assert_eq!(segments[0].active[&a], slot_morning);
        assert_eq!(segments[1].active[&a], slot_evening);
    }

    #[test]
    fn empty_input_sweeps_to_nothing() {
        assert!(sweep(&BTreeMap::new()).is_empty());
    }
}
