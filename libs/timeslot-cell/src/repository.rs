// libs/timeslot-cell/src/repository.rs
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};
use shared_models::{TherapistId, TimeSlotId};

use crate::models::TimeSlot;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TimeSlotRepository: Send + Sync {
    async fn create(&self, slot: TimeSlot) -> Result<TimeSlot, DatabaseError>;

    async fn update(&self, slot: TimeSlot) -> Result<TimeSlot, DatabaseError>;

    async fn delete(&self, id: TimeSlotId) -> Result<(), DatabaseError>;

    async fn get_by_id(&self, id: TimeSlotId) -> Result<Option<TimeSlot>, DatabaseError>;

    async fn list_by_therapist(&self, therapist_id: TherapistId)
        -> Result<Vec<TimeSlot>, DatabaseError>;

    /// Active slots for a set of therapists, the engine's expansion input.
    async fn list_active_by_therapists(
        &self,
        therapist_ids: Vec<TherapistId>,
    ) -> Result<Vec<TimeSlot>, DatabaseError>;

    /// Flip `is_active` on all of a therapist's slots; returns how many
    /// rows changed.
    async fn bulk_toggle_by_therapist(
        &self,
        therapist_id: TherapistId,
        is_active: bool,
    ) -> Result<usize, DatabaseError>;

    /// Whether any non-cancelled booking still references the slot. Deletion
    /// is refused while this holds.
    async fn has_non_cancelled_bookings(&self, id: TimeSlotId) -> Result<bool, DatabaseError>;
}

pub struct SupabaseTimeSlotRepository {
    supabase: SupabaseClient,
}

impl SupabaseTimeSlotRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl TimeSlotRepository for SupabaseTimeSlotRepository {
    async fn create(&self, slot: TimeSlot) -> Result<TimeSlot, DatabaseError> {
        debug!("Creating time slot {} for therapist {}", slot.id, slot.therapist_id);

        self.supabase
            .insert_returning("/rest/v1/time_slots", serde_json::to_value(&slot).map_err(|e| DatabaseError::Decode(e.to_string()))?)
            .await
    }

    async fn update(&self, slot: TimeSlot) -> Result<TimeSlot, DatabaseError> {
        debug!("Updating time slot {}", slot.id);

        let path = format!("/rest/v1/time_slots?id=eq.{}", slot.id);
        let changes = serde_json::to_value(&slot).map_err(|e| DatabaseError::Decode(e.to_string()))?;

        self.supabase.patch_returning(&path, changes).await
    }

    async fn delete(&self, id: TimeSlotId) -> Result<(), DatabaseError> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", id);
        self.supabase.delete(&path).await
    }

    async fn get_by_id(&self, id: TimeSlotId) -> Result<Option<TimeSlot>, DatabaseError> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", id);
        let result: Vec<TimeSlot> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn list_by_therapist(
        &self,
        therapist_id: TherapistId,
    ) -> Result<Vec<TimeSlot>, DatabaseError> {
        let path = format!(
            "/rest/v1/time_slots?therapist_id=eq.{}&order=day_of_week.asc,start.asc",
            therapist_id
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn list_active_by_therapists(
        &self,
        therapist_ids: Vec<TherapistId>,
    ) -> Result<Vec<TimeSlot>, DatabaseError> {
        if therapist_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = therapist_ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/time_slots?therapist_id=in.({})&is_active=eq.true&order=therapist_id.asc,start.asc",
            id_list
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn bulk_toggle_by_therapist(
        &self,
        therapist_id: TherapistId,
        is_active: bool,
    ) -> Result<usize, DatabaseError> {
        debug!("Toggling slots of therapist {} to is_active={}", therapist_id, is_active);

        let path = format!("/rest/v1/time_slots?therapist_id=eq.{}", therapist_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "is_active": is_active })),
                Some(headers),
            )
            .await?;

        Ok(updated.len())
    }

    async fn has_non_cancelled_bookings(&self, id: TimeSlotId) -> Result<bool, DatabaseError> {
        let path = format!(
            "/rest/v1/bookings?time_slot_id=eq.{}&state=neq.cancelled&select=id&limit=1",
            id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(!rows.is_empty())
    }
}
