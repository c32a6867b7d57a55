// libs/timeslot-cell/src/services/timeslot.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{TherapistId, TimeSlotId};

use crate::models::{
    BulkToggleRequest, CreateTimeSlotRequest, TimeSlot, TimeSlotError, UpdateTimeSlotRequest,
};
use crate::repository::{SupabaseTimeSlotRepository, TimeSlotRepository};
use crate::services::validation::{check_slot_conflicts, denormalize_from_utc, validate_slot};

pub struct TimeSlotService {
    repository: Arc<dyn TimeSlotRepository>,
}

impl TimeSlotService {
    pub fn new(repository: Arc<dyn TimeSlotRepository>) -> Self {
        Self { repository }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(SupabaseTimeSlotRepository::new(SupabaseClient::new(config))))
    }

    /// Publish a weekly slot. Validation and the overlap/gap check run fully
    /// before the write.
    pub async fn create_slot(
        &self,
        therapist_id: &TherapistId,
        request: CreateTimeSlotRequest,
    ) -> Result<TimeSlot, TimeSlotError> {
        debug!("Creating time slot for therapist {}", therapist_id);

        let normalized = validate_slot(&request)?;

        let existing = self.repository.list_by_therapist(therapist_id.clone()).await?;
        check_slot_conflicts(&normalized, &existing, None)?;

        let now = Utc::now();
        let slot = TimeSlot {
            id: TimeSlotId::new(),
            therapist_id: therapist_id.clone(),
            is_active: true,
            day_of_week: normalized.day_of_week,
            start: normalized.start,
            duration_minutes: normalized.duration_minutes,
            advance_notice_minutes: normalized.advance_notice_minutes,
            after_session_break_minutes: normalized.after_session_break_minutes,
            timezone_offset: normalized.timezone_offset,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(slot).await?;
        info!("Time slot {} created for therapist {}", created.id, therapist_id);

        Ok(created)
    }

    /// Update a slot in place. Unset fields keep their stored values; the
    /// merged result is re-validated as a whole, excluding the slot itself
    /// from the conflict check.
    pub async fn update_slot(
        &self,
        therapist_id: &TherapistId,
        slot_id: &TimeSlotId,
        request: UpdateTimeSlotRequest,
    ) -> Result<TimeSlot, TimeSlotError> {
        debug!("Updating time slot {}", slot_id);

        let current = self.get_owned_slot(therapist_id, slot_id).await?;

        // Stored fields are UTC-normalized; merge against the authored local
        // wall clock so re-normalization does not shift them twice.
        let (local_day, local_start) = denormalize_from_utc(
            current.day_of_week,
            current.start,
            current.timezone_offset,
        );

        let merged = CreateTimeSlotRequest {
            day_of_week: request
                .day_of_week
                .unwrap_or_else(|| local_day.to_string()),
            start: request.start.unwrap_or_else(|| local_start.to_string()),
            duration_minutes: request.duration_minutes.unwrap_or(current.duration_minutes),
            advance_notice_minutes: Some(
                request
                    .advance_notice_minutes
                    .unwrap_or(current.advance_notice_minutes),
            ),
            after_session_break_minutes: Some(
                request
                    .after_session_break_minutes
                    .unwrap_or(current.after_session_break_minutes),
            ),
            timezone_offset: Some(
                request
                    .timezone_offset
                    .unwrap_or(current.timezone_offset.minutes()),
            ),
        };
        let normalized = validate_slot(&merged)?;

        let existing = self.repository.list_by_therapist(therapist_id.clone()).await?;
        check_slot_conflicts(&normalized, &existing, Some(slot_id))?;

        let updated = TimeSlot {
            id: current.id,
            therapist_id: current.therapist_id,
            is_active: request.is_active.unwrap_or(current.is_active),
            day_of_week: normalized.day_of_week,
            start: normalized.start,
            duration_minutes: normalized.duration_minutes,
            advance_notice_minutes: normalized.advance_notice_minutes,
            after_session_break_minutes: normalized.after_session_break_minutes,
            timezone_offset: normalized.timezone_offset,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        Ok(self.repository.update(updated).await?)
    }

    /// Remove a slot. Refused while any non-cancelled booking references it.
    pub async fn delete_slot(
        &self,
        therapist_id: &TherapistId,
        slot_id: &TimeSlotId,
    ) -> Result<(), TimeSlotError> {
        let slot = self.get_owned_slot(therapist_id, slot_id).await?;

        if self.repository.has_non_cancelled_bookings(slot.id.clone()).await? {
            return Err(TimeSlotError::HasActiveBookings);
        }

        self.repository.delete(slot.id.clone()).await?;
        info!("Time slot {} deleted", slot.id);

        Ok(())
    }

    pub async fn get_slot(
        &self,
        therapist_id: &TherapistId,
        slot_id: &TimeSlotId,
    ) -> Result<TimeSlot, TimeSlotError> {
        self.get_owned_slot(therapist_id, slot_id).await
    }

    pub async fn list_slots(
        &self,
        therapist_id: &TherapistId,
    ) -> Result<Vec<TimeSlot>, TimeSlotError> {
        Ok(self.repository.list_by_therapist(therapist_id.clone()).await?)
    }

    pub async fn bulk_toggle(
        &self,
        therapist_id: &TherapistId,
        request: BulkToggleRequest,
    ) -> Result<usize, TimeSlotError> {
        let count = self
            .repository
            .bulk_toggle_by_therapist(therapist_id.clone(), request.is_active)
            .await?;
        info!(
            "Toggled {} slots of therapist {} to is_active={}",
            count, therapist_id, request.is_active
        );

        Ok(count)
    }

    /// A slot owned by a different therapist is reported as absent.
    async fn get_owned_slot(
        &self,
        therapist_id: &TherapistId,
        slot_id: &TimeSlotId,
    ) -> Result<TimeSlot, TimeSlotError> {
        let slot = self
            .repository
            .get_by_id(slot_id.clone())
            .await?
            .ok_or(TimeSlotError::NotFound)?;

        if slot.therapist_id != *therapist_id {
            return Err(TimeSlotError::NotFound);
        }

        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::{DayOfWeek, TimezoneOffset, MIN_AFTER_SESSION_BREAK_MINUTES};

    use crate::repository::MockTimeSlotRepository;

    fn stored_slot(therapist_id: &TherapistId) -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            therapist_id: therapist_id.clone(),
            is_active: true,
            day_of_week: DayOfWeek::Monday,
            start: "09:00".parse().unwrap(),
            duration_minutes: 120,
            advance_notice_minutes: 0,
            after_session_break_minutes: MIN_AFTER_SESSION_BREAK_MINUTES,
            timezone_offset: TimezoneOffset::UTC,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_request(start: &str) -> CreateTimeSlotRequest {
        CreateTimeSlotRequest {
            day_of_week: "Monday".to_string(),
            start: start.to_string(),
            duration_minutes: 60,
            advance_notice_minutes: None,
            after_session_break_minutes: None,
            timezone_offset: None,
        }
    }

    #[tokio::test]
    async fn create_persists_a_conflict_free_slot() {
        let therapist_id = TherapistId::new();
        let mut repo = MockTimeSlotRepository::new();
        repo.expect_list_by_therapist().returning(|_| Ok(vec![]));
        repo.expect_create().returning(|slot| Ok(slot));

        let service = TimeSlotService::new(Arc::new(repo));
        let created = service
            .create_slot(&therapist_id, create_request("13:00"))
            .await
            .unwrap();

        assert_eq!(created.therapist_id, therapist_id);
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn create_rejects_overlap_without_writing() {
        let therapist_id = TherapistId::new();
        let existing = stored_slot(&therapist_id);

        let mut repo = MockTimeSlotRepository::new();
        repo.expect_list_by_therapist()
            .returning(move |_| Ok(vec![existing.clone()]));
        repo.expect_create().never();

        let service = TimeSlotService::new(Arc::new(repo));
        let result = service.create_slot(&therapist_id, create_request("10:00")).await;

        assert_matches!(result, Err(TimeSlotError::OverlappingSlot));
    }

    #[tokio::test]
    async fn delete_refuses_slot_with_bookings() {
        let therapist_id = TherapistId::new();
        let slot = stored_slot(&therapist_id);
        let slot_id = slot.id.clone();

        let mut repo = MockTimeSlotRepository::new();
        repo.expect_get_by_id().returning(move |_| Ok(Some(slot.clone())));
        repo.expect_has_non_cancelled_bookings().returning(|_| Ok(true));
        repo.expect_delete().never();

        let service = TimeSlotService::new(Arc::new(repo));
        let result = service.delete_slot(&therapist_id, &slot_id).await;

        assert_matches!(result, Err(TimeSlotError::HasActiveBookings));
    }

    #[tokio::test]
    async fn foreign_slot_reads_as_not_found() {
        let owner = TherapistId::new();
        let other = TherapistId::new();
        let slot = stored_slot(&owner);
        let slot_id = slot.id.clone();

        let mut repo = MockTimeSlotRepository::new();
        repo.expect_get_by_id().returning(move |_| Ok(Some(slot.clone())));

        let service = TimeSlotService::new(Arc::new(repo));
        let result = service.get_slot(&other, &slot_id).await;

        assert_matches!(result, Err(TimeSlotError::NotFound));
    }
}
