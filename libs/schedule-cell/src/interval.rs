// libs/schedule-cell/src/interval.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` span of absolute time; `end > start` always.
/// Half-open endpoints keep touching spans from double-counting an instant:
/// one ending at `t` and one starting at `t` do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The parts of `self` not covered by `blocks`, which must be sorted by
    /// start and pairwise disjoint. Split points are exactly the block
    /// endpoints clipped into `self`.
    pub fn subtract(&self, blocks: &[Interval]) -> Vec<Interval> {
        let mut remaining = Vec::new();
        let mut cursor = self.start;

        for block in blocks {
            if block.end <= cursor {
                continue;
            }
            if block.start >= self.end {
                break;
            }
            if block.start > cursor {
                remaining.push(Interval {
                    start: cursor,
                    end: block.start,
                });
            }
            cursor = cursor.max(block.end);
            if cursor >= self.end {
                return remaining;
            }
        }

        if cursor < self.end {
            remaining.push(Interval {
                start: cursor,
                end: self.end,
            });
        }

        remaining
    }
}

/// Sorted, pairwise-disjoint union of the given intervals. Touching
/// endpoints coalesce: `[1,2) ∪ [2,3) = [1,3)`.
pub fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    if intervals.is_empty() {
        return intervals;
    }

    intervals.sort_by_key(|interval| interval.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }

    merged
}
