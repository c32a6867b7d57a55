// libs/schedule-cell/src/services/availability.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use booking_cell::repository::{BookingRepository, SupabaseBookingRepository};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{TherapistId, TimeSlotId};
use therapist_cell::models::Therapist;
use therapist_cell::repository::{SupabaseTherapistRepository, TherapistRepository};
use timeslot_cell::models::TimeSlot;
use timeslot_cell::repository::{SupabaseTimeSlotRepository, TimeSlotRepository};

use crate::models::{AvailableTimeRange, ExpandedInterval, ScheduleError, ScheduleQuery, TherapistInfo};
use crate::services::blocks::booking_blocks;
use crate::services::expansion::expand_slot;
use crate::services::pool::select_pool;
use crate::services::sweep::sweep;

pub struct ScheduleService {
    therapists: Arc<dyn TherapistRepository>,
    time_slots: Arc<dyn TimeSlotRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl ScheduleService {
    pub fn new(
        therapists: Arc<dyn TherapistRepository>,
        time_slots: Arc<dyn TimeSlotRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            therapists,
            time_slots,
            bookings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(SupabaseTherapistRepository::new(SupabaseClient::new(config))),
            Arc::new(SupabaseTimeSlotRepository::new(SupabaseClient::new(config))),
            Arc::new(SupabaseBookingRepository::new(SupabaseClient::new(config))),
        )
    }

    /// The schedule query: pool selection, recurrence expansion, block
    /// subtraction and the overlap sweep, in that order. Deterministic for a
    /// fixed repository snapshot.
    pub async fn compute_availability(
        &self,
        query: &ScheduleQuery,
    ) -> Result<Vec<AvailableTimeRange>, ScheduleError> {
        let pool = select_pool(self.therapists.as_ref(), &query.selector, query.requires_english)
            .await?;
        if pool.is_empty() {
            return Ok(vec![]);
        }

        let pool_ids: Vec<TherapistId> = pool.iter().map(|t| t.id.clone()).collect();

        // Bookings are fetched one day past each window edge: blocks reach
        // backwards by advance notice and forwards past cross-midnight tails.
        let window_start_instant = query.start_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let window_end_instant =
            (query.end_date + Duration::days(2)).and_hms_opt(0, 0, 0).unwrap().and_utc();

        let (slots, bookings) = futures::future::try_join(
            self.time_slots.list_active_by_therapists(pool_ids.clone()),
            self.bookings.list_blocking_in_range(
                pool_ids,
                window_start_instant - Duration::days(1),
                window_end_instant,
            ),
        )
        .await?;

        debug!(
            "Computing availability for {} therapists over {} slots and {} bookings",
            pool.len(),
            slots.len(),
            bookings.len()
        );

        let slots_by_id: HashMap<TimeSlotId, TimeSlot> =
            slots.iter().map(|slot| (slot.id.clone(), slot.clone())).collect();
        let blocks = booking_blocks(&bookings, &slots_by_id);

        let mut free_by_therapist: BTreeMap<TherapistId, Vec<ExpandedInterval>> = BTreeMap::new();
        for therapist in &pool {
            let free = free_intervals_for(
                &therapist.id,
                &slots,
                blocks.get(&therapist.id).map(Vec::as_slice).unwrap_or(&[]),
                query.start_date,
                query.end_date,
            );
            if !free.is_empty() {
                free_by_therapist.insert(therapist.id.clone(), free);
            }
        }

        let therapists_by_id: HashMap<&TherapistId, &Therapist> =
            pool.iter().map(|t| (&t.id, t)).collect();

        let ranges = sweep(&free_by_therapist)
            .into_iter()
            .map(|segment| {
                let therapists = segment
                    .active
                    .iter()
                    .filter_map(|(therapist_id, slot_id)| {
                        therapists_by_id
                            .get(therapist_id)
                            .map(|t| TherapistInfo::from_therapist(t, slot_id.clone()))
                    })
                    .collect();

                AvailableTimeRange {
                    date: segment
                        .interval
                        .start
                        .date_naive()
                        .and_hms_opt(0, 0, 0)
                        .unwrap()
                        .and_utc(),
                    start_time: segment.interval.start,
                    end_time: segment.interval.end,
                    duration_minutes: segment.interval.duration_minutes(),
                    therapists,
                }
            })
            .collect();

        Ok(ranges)
    }
}

/// One therapist's bookable time: each expanded slot occurrence minus the
/// therapist's merged blocks. Fragments keep the id of the slot they came
/// from; a therapist's active slots never overlap, so the origin is unique.
fn free_intervals_for(
    therapist_id: &TherapistId,
    all_slots: &[TimeSlot],
    blocks: &[crate::interval::Interval],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<ExpandedInterval> {
    let mut free = Vec::new();

    for slot in all_slots.iter().filter(|slot| slot.therapist_id == *therapist_id) {
        for occurrence in expand_slot(slot, window_start, window_end) {
            for fragment in occurrence.interval.subtract(blocks) {
                free.push(ExpandedInterval {
                    interval: fragment,
                    time_slot_id: occurrence.time_slot_id.clone(),
                });
            }
        }
    }

    free.sort_by_key(|f| f.interval.start);
    free
}
