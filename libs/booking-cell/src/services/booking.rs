// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{BookingId, ClientId, DayOfWeek, SessionId, TherapistId, TimeSlotId, TimezoneOffset};
use therapist_cell::repository::{ClientRepository, SupabaseClientRepository, SupabaseTherapistRepository, TherapistRepository};
use timeslot_cell::models::TimeSlot;
use timeslot_cell::repository::{SupabaseTimeSlotRepository, TimeSlotRepository};

use crate::models::{
    Booking, BookingError, BookingState, ConfirmBookingRequest, CreateBookingRequest,
    PushNotification, Session, SessionLanguage, SessionState, DEFAULT_BOOKING_DURATION_MINUTES,
};
use crate::repository::{BookingRepository, ConfirmedBooking, SupabaseBookingRepository};
use crate::services::notification::{NotificationPort, PushGatewayNotifier};

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    therapists: Arc<dyn TherapistRepository>,
    clients: Arc<dyn ClientRepository>,
    time_slots: Arc<dyn TimeSlotRepository>,
    notifier: Arc<dyn NotificationPort>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        therapists: Arc<dyn TherapistRepository>,
        clients: Arc<dyn ClientRepository>,
        time_slots: Arc<dyn TimeSlotRepository>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            bookings,
            therapists,
            clients,
            time_slots,
            notifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(SupabaseBookingRepository::new(SupabaseClient::new(config))),
            Arc::new(SupabaseTherapistRepository::new(SupabaseClient::new(config))),
            Arc::new(SupabaseClientRepository::new(SupabaseClient::new(config))),
            Arc::new(SupabaseTimeSlotRepository::new(SupabaseClient::new(config))),
            Arc::new(PushGatewayNotifier::new(config)),
        )
    }

    /// Reserve a concrete occurrence of a weekly slot. All checks run before
    /// the single write; the store's uniqueness predicate turns a concurrent
    /// duplicate into `TimeSlotAlreadyBooked`.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        debug!(
            "Creating booking on slot {} at {}",
            request.time_slot_id, request.start_time
        );

        if request.therapist_id.is_empty()
            || request.client_id.is_empty()
            || request.time_slot_id.is_empty()
        {
            return Err(BookingError::ValidationError(
                "therapist_id, client_id and time_slot_id are required".to_string(),
            ));
        }

        let client_offset = TimezoneOffset::try_new(request.client_timezone_offset)
            .map_err(BookingError::ValidationError)?;

        let therapist_id = TherapistId::from_string(request.therapist_id);
        let client_id = ClientId::from_string(request.client_id);
        let slot_id = TimeSlotId::from_string(request.time_slot_id);

        let slot = self
            .time_slots
            .get_by_id(slot_id.clone())
            .await?
            .ok_or(BookingError::TimeSlotNotFound)?;
        if slot.therapist_id != therapist_id {
            // A slot of a different therapist is indistinguishable from a
            // missing one to the caller.
            return Err(BookingError::TimeSlotNotFound);
        }
        if !slot.is_active {
            return Err(BookingError::ValidationError(
                "time slot is not active".to_string(),
            ));
        }

        self.therapists
            .get_by_id(therapist_id.clone())
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or(BookingError::TherapistNotFound)?;
        self.clients
            .get_by_id(client_id.clone())
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or(BookingError::ClientNotFound)?;

        if !fits_slot_window(&slot, request.start_time, DEFAULT_BOOKING_DURATION_MINUTES) {
            return Err(BookingError::ValidationError(
                "start time is outside the slot's recurring window".to_string(),
            ));
        }

        let earliest_start = Utc::now() + Duration::minutes(slot.advance_notice_minutes as i64);
        if request.start_time < earliest_start {
            return Err(BookingError::ValidationError(format!(
                "booking requires {} minutes of advance notice",
                slot.advance_notice_minutes
            )));
        }

        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            time_slot_id: slot_id,
            therapist_id,
            client_id,
            start_time: request.start_time,
            duration_minutes: DEFAULT_BOOKING_DURATION_MINUTES,
            client_timezone_offset: client_offset,
            state: BookingState::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = self.bookings.create(booking).await.map_err(|e| match e {
            shared_database::DatabaseError::Conflict(_) => BookingError::TimeSlotAlreadyBooked,
            other => BookingError::DatabaseError(other.to_string()),
        })?;
        info!("Booking {} created", created.id);

        Ok(created)
    }

    /// `pending → confirmed`: persists the state change and materializes the
    /// planned session in one transaction, then notifies the therapist's
    /// device best-effort.
    pub async fn confirm_booking(
        &self,
        booking_id: &BookingId,
        request: ConfirmBookingRequest,
    ) -> Result<ConfirmedBooking, BookingError> {
        if request.paid_amount <= 0 {
            return Err(BookingError::ValidationError(
                "paid amount must be positive".to_string(),
            ));
        }
        let language: SessionLanguage = request
            .language
            .parse()
            .map_err(BookingError::ValidationError)?;

        let booking = self
            .bookings
            .get_by_id(booking_id.clone())
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        if booking.state != BookingState::Pending {
            return Err(BookingError::InvalidStateTransition(format!(
                "confirm on {} booking",
                booking.state
            )));
        }

        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            booking_id: booking.id.clone(),
            therapist_id: booking.therapist_id.clone(),
            client_id: booking.client_id.clone(),
            time_slot_id: booking.time_slot_id.clone(),
            start_time: booking.start_time,
            duration_minutes: booking.duration_minutes,
            client_timezone_offset: booking.client_timezone_offset,
            paid_amount: request.paid_amount,
            language,
            state: SessionState::Planned,
            notes: String::new(),
            meeting_url: None,
            created_at: now,
            updated_at: now,
        };

        let confirmed = self
            .bookings
            .confirm_with_session(booking.id.clone(), session)
            .await?;
        info!(
            "Booking {} confirmed, session {} created",
            confirmed.booking.id, confirmed.session.id
        );

        self.notify_therapist(&confirmed.booking).await;

        Ok(confirmed)
    }

    /// `pending|confirmed → cancelled`. Cancelling an already-cancelled
    /// booking is rejected; the derived session, if any, is left untouched.
    pub async fn cancel_booking(&self, booking_id: &BookingId) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .get_by_id(booking_id.clone())
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        match booking.state {
            BookingState::Pending | BookingState::Confirmed => {
                let cancelled = self
                    .bookings
                    .update_state(booking.id.clone(), BookingState::Cancelled)
                    .await?;
                info!("Booking {} cancelled", cancelled.id);
                Ok(cancelled)
            }
            BookingState::Cancelled => Err(BookingError::InvalidStateTransition(
                "cancel on cancelled booking".to_string(),
            )),
        }
    }

    pub async fn get_booking(&self, booking_id: &BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .get_by_id(booking_id.clone())
            .await?
            .ok_or(BookingError::BookingNotFound)
    }

    pub async fn list_by_therapist(
        &self,
        therapist_id: &TherapistId,
        state: Option<String>,
    ) -> Result<Vec<Booking>, BookingError> {
        let state = parse_state_filter(state)?;
        Ok(self
            .bookings
            .list_by_therapist(therapist_id.clone(), state)
            .await?)
    }

    pub async fn list_by_client(
        &self,
        client_id: &ClientId,
        state: Option<String>,
    ) -> Result<Vec<Booking>, BookingError> {
        let state = parse_state_filter(state)?;
        Ok(self.bookings.list_by_client(client_id.clone(), state).await?)
    }

    /// Best-effort push to the therapist's device. Failure never unwinds the
    /// confirmation.
    async fn notify_therapist(&self, booking: &Booking) {
        let therapist = match self.therapists.get_by_id(booking.therapist_id.clone()).await {
            Ok(Some(therapist)) => therapist,
            Ok(None) => {
                warn!(
                    "Therapist {} missing while notifying for booking {}",
                    booking.therapist_id, booking.id
                );
                return;
            }
            Err(e) => {
                warn!("Therapist lookup failed while notifying: {}", e);
                return;
            }
        };

        let Some(device_id) = therapist.device_id else {
            debug!(
                "Therapist {} has no registered device, skipping notification",
                therapist.id
            );
            return;
        };

        let notification = PushNotification {
            title: "Booking confirmed".to_string(),
            body: format!("A session starts at {}", booking.start_time.to_rfc3339()),
        };

        match self.notifier.send(device_id, notification).await {
            Ok(notification_id) => {
                debug!("Notification {} dispatched", notification_id);
            }
            Err(e) => {
                warn!(
                    "Notification dispatch failed for booking {}: {}",
                    booking.id, e
                );
            }
        }
    }
}

/// Whether `[start, start+duration)` lies inside the slot's recurring UTC
/// window. The occurrence on the previous date is also considered, since a
/// cross-midnight slot hosts start times on the following UTC day.
fn fits_slot_window(slot: &TimeSlot, start: DateTime<Utc>, duration_minutes: i32) -> bool {
    let end = start + Duration::minutes(duration_minutes as i64);
    let date = start.date_naive();

    for candidate in [date, date - Duration::days(1)] {
        if DayOfWeek::from(candidate.weekday()) != slot.day_of_week {
            continue;
        }
        let (window_start, window_end) = slot.occurrence_on(candidate);
        if start >= window_start && end <= window_end {
            return true;
        }
    }

    false
}

fn parse_state_filter(state: Option<String>) -> Result<Option<BookingState>, BookingError> {
    state
        .map(|s| s.parse::<BookingState>().map_err(BookingError::ValidationError))
        .transpose()
}
