// libs/booking-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{BookingId, ClientId, SessionId, TherapistId, TimeSlotId, TimezoneOffset};

pub const DEFAULT_BOOKING_DURATION_MINUTES: i32 = 60;

// ==============================================================================
// BOOKING
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Cancelled)
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingState::Pending => write!(f, "pending"),
            BookingState::Confirmed => write!(f, "confirmed"),
            BookingState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(BookingState::Pending),
            "confirmed" => Ok(BookingState::Confirmed),
            "cancelled" => Ok(BookingState::Cancelled),
            other => Err(format!("invalid booking state: {other:?}")),
        }
    }
}

/// A client's reservation of one concrete occurrence of a weekly slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub time_slot_id: TimeSlotId,
    pub therapist_id: TherapistId,
    pub client_id: ClientId,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub client_timezone_offset: TimezoneOffset,
    pub state: BookingState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

// ==============================================================================
// SESSION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Planned,
    Done,
    Rescheduled,
    Cancelled,
    Refunded,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Planned)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Planned => write!(f, "planned"),
            SessionState::Done => write!(f, "done"),
            SessionState::Rescheduled => write!(f, "rescheduled"),
            SessionState::Cancelled => write!(f, "cancelled"),
            SessionState::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLanguage {
    Arabic,
    English,
}

impl FromStr for SessionLanguage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "arabic" => Ok(SessionLanguage::Arabic),
            "english" => Ok(SessionLanguage::English),
            other => Err(format!("invalid session language: {other:?}")),
        }
    }
}

/// Materialized when a booking is confirmed; 1:1 with the triggering booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub booking_id: BookingId,
    pub therapist_id: TherapistId,
    pub client_id: ClientId,
    pub time_slot_id: TimeSlotId,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub client_timezone_offset: TimezoneOffset,
    /// Integer minor units.
    pub paid_amount: i64,
    pub language: SessionLanguage,
    pub state: SessionState,
    /// Append-only transcript; see `SessionService::append_notes`.
    #[serde(default)]
    pub notes: String,
    pub meeting_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub therapist_id: String,
    pub client_id: String,
    pub time_slot_id: String,
    pub start_time: DateTime<Utc>,
    pub client_timezone_offset: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    pub paid_amount: i64,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionStateRequest {
    pub state: SessionState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendNotesRequest {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMeetingUrlRequest {
    pub meeting_url: String,
}

/// Push payload handed to the notification gateway at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found")]
    BookingNotFound,

    #[error("Therapist not found")]
    TherapistNotFound,

    #[error("Client not found")]
    ClientNotFound,

    #[error("Time slot not found")]
    TimeSlotNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Time slot already booked at this start time")]
    TimeSlotAlreadyBooked,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<shared_database::DatabaseError> for BookingError {
    // Conflict is NOT translated here: only the create path may report
    // TimeSlotAlreadyBooked, and it maps the store's 409 at the call site.
    fn from(err: shared_database::DatabaseError) -> Self {
        BookingError::DatabaseError(err.to_string())
    }
}

impl From<BookingError> for shared_models::AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::BookingNotFound
            | BookingError::TherapistNotFound
            | BookingError::ClientNotFound
            | BookingError::TimeSlotNotFound
            | BookingError::SessionNotFound => shared_models::AppError::NotFound(err.to_string()),
            BookingError::TimeSlotAlreadyBooked => shared_models::AppError::Conflict(err.to_string()),
            BookingError::InvalidStateTransition(msg) => shared_models::AppError::BadRequest(format!(
                "Invalid state transition: {msg}"
            )),
            BookingError::ValidationError(msg) => shared_models::AppError::ValidationError(msg),
            BookingError::DatabaseError(msg) => shared_models::AppError::Database(msg),
        }
    }
}
