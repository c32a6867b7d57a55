// libs/booking-cell/src/repository.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};
use shared_models::{BookingId, ClientId, SessionId, TherapistId};

use crate::models::{Booking, BookingState, Session, SessionState};

/// Result of the atomic confirm transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmedBooking {
    pub booking: Booking,
    pub session: Session,
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking. The store's conditional uniqueness predicate on
    /// `(time_slot_id, start_time)` for non-cancelled rows makes concurrent
    /// duplicates fail with a conflict.
    async fn create(&self, booking: Booking) -> Result<Booking, DatabaseError>;

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, DatabaseError>;

    async fn update_state(
        &self,
        id: BookingId,
        state: BookingState,
    ) -> Result<Booking, DatabaseError>;

    /// Booking update and session insert in one transaction.
    async fn confirm_with_session(
        &self,
        booking_id: BookingId,
        session: Session,
    ) -> Result<ConfirmedBooking, DatabaseError>;

    async fn list_by_therapist(
        &self,
        therapist_id: TherapistId,
        state: Option<BookingState>,
    ) -> Result<Vec<Booking>, DatabaseError>;

    async fn list_by_client(
        &self,
        client_id: ClientId,
        state: Option<BookingState>,
    ) -> Result<Vec<Booking>, DatabaseError>;

    /// All non-cancelled bookings of the given therapists starting within
    /// `[from, to)`; feeds the availability engine's block extraction.
    async fn list_blocking_in_range(
        &self,
        therapist_ids: Vec<TherapistId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DatabaseError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, DatabaseError>;

    async fn save_state(
        &self,
        id: SessionId,
        state: SessionState,
    ) -> Result<Session, DatabaseError>;

    async fn save_notes(&self, id: SessionId, notes: String) -> Result<Session, DatabaseError>;

    async fn save_meeting_url(
        &self,
        id: SessionId,
        meeting_url: String,
    ) -> Result<Session, DatabaseError>;

    async fn list_by_therapist(
        &self,
        therapist_id: TherapistId,
    ) -> Result<Vec<Session>, DatabaseError>;

    async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Session>, DatabaseError>;
}

// ==============================================================================
// SUPABASE IMPLEMENTATIONS
// ==============================================================================

pub struct SupabaseBookingRepository {
    supabase: SupabaseClient,
}

impl SupabaseBookingRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    fn state_filter(state: Option<BookingState>) -> String {
        match state {
            Some(state) => format!("&state=eq.{state}"),
            None => String::new(),
        }
    }
}

#[async_trait]
impl BookingRepository for SupabaseBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking, DatabaseError> {
        debug!("Creating booking {} on slot {}", booking.id, booking.time_slot_id);

        let row = serde_json::to_value(&booking).map_err(|e| DatabaseError::Decode(e.to_string()))?;
        self.supabase.insert_returning("/rest/v1/bookings", row).await
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, DatabaseError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let result: Vec<Booking> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn update_state(
        &self,
        id: BookingId,
        state: BookingState,
    ) -> Result<Booking, DatabaseError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let changes = json!({
            "state": state,
            "updated_at": Utc::now().to_rfc3339(),
        });

        self.supabase.patch_returning(&path, changes).await
    }

    async fn confirm_with_session(
        &self,
        booking_id: BookingId,
        session: Session,
    ) -> Result<ConfirmedBooking, DatabaseError> {
        debug!("Confirming booking {} with session {}", booking_id, session.id);

        let session_row =
            serde_json::to_value(&session).map_err(|e| DatabaseError::Decode(e.to_string()))?;

        self.supabase
            .rpc(
                "confirm_booking",
                json!({
                    "p_booking_id": booking_id,
                    "p_session": session_row,
                }),
            )
            .await
    }

    async fn list_by_therapist(
        &self,
        therapist_id: TherapistId,
        state: Option<BookingState>,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let path = format!(
            "/rest/v1/bookings?therapist_id=eq.{}{}&order=start_time.asc",
            therapist_id,
            Self::state_filter(state)
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn list_by_client(
        &self,
        client_id: ClientId,
        state: Option<BookingState>,
    ) -> Result<Vec<Booking>, DatabaseError> {
        // Grouped by the scanned client_id column.
        let path = format!(
            "/rest/v1/bookings?client_id=eq.{}{}&order=start_time.asc",
            client_id,
            Self::state_filter(state)
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn list_blocking_in_range(
        &self,
        therapist_ids: Vec<TherapistId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DatabaseError> {
        if therapist_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = therapist_ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let from_str = from.to_rfc3339();
        let to_str = to.to_rfc3339();
        let path = format!(
            "/rest/v1/bookings?therapist_id=in.({})&state=neq.cancelled&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            id_list,
            urlencoding::encode(&from_str),
            urlencoding::encode(&to_str),
        );

        self.supabase.request(Method::GET, &path, None).await
    }
}

pub struct SupabaseSessionRepository {
    supabase: SupabaseClient,
}

impl SupabaseSessionRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn patch(&self, id: &SessionId, changes: serde_json::Value) -> Result<Session, DatabaseError> {
        let path = format!("/rest/v1/sessions?id=eq.{}", id);
        self.supabase.patch_returning(&path, changes).await
    }
}

#[async_trait]
impl SessionRepository for SupabaseSessionRepository {
    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, DatabaseError> {
        let path = format!("/rest/v1/sessions?id=eq.{}", id);
        let result: Vec<Session> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn save_state(
        &self,
        id: SessionId,
        state: SessionState,
    ) -> Result<Session, DatabaseError> {
        self.patch(&id, json!({ "state": state, "updated_at": Utc::now().to_rfc3339() }))
            .await
    }

    async fn save_notes(&self, id: SessionId, notes: String) -> Result<Session, DatabaseError> {
        self.patch(&id, json!({ "notes": notes, "updated_at": Utc::now().to_rfc3339() }))
            .await
    }

    async fn save_meeting_url(
        &self,
        id: SessionId,
        meeting_url: String,
    ) -> Result<Session, DatabaseError> {
        self.patch(
            &id,
            json!({ "meeting_url": meeting_url, "updated_at": Utc::now().to_rfc3339() }),
        )
        .await
    }

    async fn list_by_therapist(
        &self,
        therapist_id: TherapistId,
    ) -> Result<Vec<Session>, DatabaseError> {
        let path = format!(
            "/rest/v1/sessions?therapist_id=eq.{}&order=start_time.asc",
            therapist_id
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Session>, DatabaseError> {
        let path = format!(
            "/rest/v1/sessions?client_id=eq.{}&order=start_time.asc",
            client_id
        );

        self.supabase.request(Method::GET, &path, None).await
    }
}
