// libs/timeslot-cell/src/models.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{
    DayOfWeek, TherapistId, Time24h, TimeSlotId, TimezoneOffset,
    MIN_AFTER_SESSION_BREAK_MINUTES,
};

/// A therapist's weekly recurring availability window, stored UTC-normalized:
/// `day_of_week` and `start` are the UTC day and wall-clock start, while
/// `timezone_offset` records the offset used at authoring time for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub therapist_id: TherapistId,
    pub is_active: bool,
    pub day_of_week: DayOfWeek,
    pub start: Time24h,
    pub duration_minutes: i32,
    pub advance_notice_minutes: i32,
    pub after_session_break_minutes: i32,
    pub timezone_offset: TimezoneOffset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn start_minutes(&self) -> i32 {
        self.start.minutes_from_midnight()
    }

    pub fn end_minutes(&self) -> i32 {
        self.start_minutes() + self.duration_minutes
    }

    /// Break after the session, never below the enforced minimum.
    pub fn effective_break_minutes(&self) -> i32 {
        self.after_session_break_minutes.max(MIN_AFTER_SESSION_BREAK_MINUTES)
    }

    /// Window including pre/post buffers, in minutes relative to the slot's
    /// UTC day midnight. Used for overlap and gap checks between slots.
    pub fn effective_range_minutes(&self) -> (i32, i32) {
        (
            self.start_minutes() - self.advance_notice_minutes,
            self.end_minutes() + self.effective_break_minutes(),
        )
    }

    /// The concrete `[start, end)` instants of this slot's occurrence on a
    /// given UTC date. The end may fall on the next calendar day.
    pub fn occurrence_on(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let time = NaiveTime::from_hms_opt(self.start.hour() as u32, self.start.minute() as u32, 0)
            .unwrap();
        let start = date.and_time(time).and_utc();

        (start, start + Duration::minutes(self.duration_minutes as i64))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Raw create payload. Day and time arrive as strings so validation can
/// enforce the exact accepted shapes instead of serde's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimeSlotRequest {
    pub day_of_week: String,
    pub start: String,
    pub duration_minutes: i32,
    pub advance_notice_minutes: Option<i32>,
    pub after_session_break_minutes: Option<i32>,
    /// Offset of the submitted wall-clock values; storage is UTC-normalized.
    pub timezone_offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTimeSlotRequest {
    pub day_of_week: Option<String>,
    pub start: Option<String>,
    pub duration_minutes: Option<i32>,
    pub advance_notice_minutes: Option<i32>,
    pub after_session_break_minutes: Option<i32>,
    pub timezone_offset: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkToggleRequest {
    pub is_active: bool,
}

/// A slot's UTC-normalized fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSlot {
    pub day_of_week: DayOfWeek,
    pub start: Time24h,
    pub duration_minutes: i32,
    pub advance_notice_minutes: i32,
    pub after_session_break_minutes: i32,
    pub timezone_offset: TimezoneOffset,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum TimeSlotError {
    #[error("Time slot not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Time slot overlaps an existing slot")]
    OverlappingSlot,

    #[error("Gap to the nearest slot is below 30 minutes")]
    InsufficientGap,

    #[error("Time slot has non-cancelled bookings")]
    HasActiveBookings,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<shared_database::DatabaseError> for TimeSlotError {
    fn from(err: shared_database::DatabaseError) -> Self {
        match err {
            shared_database::DatabaseError::NotFound(_) => TimeSlotError::NotFound,
            other => TimeSlotError::DatabaseError(other.to_string()),
        }
    }
}

impl From<TimeSlotError> for shared_models::AppError {
    fn from(err: TimeSlotError) -> Self {
        match err {
            TimeSlotError::NotFound => shared_models::AppError::NotFound(err.to_string()),
            TimeSlotError::ValidationError(msg) => shared_models::AppError::ValidationError(msg),
            TimeSlotError::OverlappingSlot | TimeSlotError::InsufficientGap | TimeSlotError::HasActiveBookings => {
                shared_models::AppError::Conflict(err.to_string())
            }
            TimeSlotError::DatabaseError(msg) => shared_models::AppError::Database(msg),
        }
    }
}
