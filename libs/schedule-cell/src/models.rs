// libs/schedule-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{TherapistId, TimeSlotId};
use therapist_cell::models::Therapist;

use crate::interval::Interval;

/// A validated schedule query: exactly one selector, a resolved inclusive
/// date window, and the optional language restriction.
#[derive(Debug, Clone)]
pub struct ScheduleQuery {
    pub selector: PoolSelector,
    pub requires_english: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub enum PoolSelector {
    Specialization(String),
    TherapistIds(Vec<TherapistId>),
}

/// One expanded occurrence of a weekly slot, tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedInterval {
    pub interval: Interval,
    pub time_slot_id: TimeSlotId,
}

/// Therapist payload inside an availability range, §6.1 response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistInfo {
    pub id: TherapistId,
    pub name: String,
    pub specializations: Vec<String>,
    pub speaks_english: bool,
    pub time_slot_id: TimeSlotId,
}

impl TherapistInfo {
    pub fn from_therapist(therapist: &Therapist, time_slot_id: TimeSlotId) -> Self {
        Self {
            id: therapist.id.clone(),
            name: therapist.name.clone(),
            specializations: therapist
                .specializations
                .iter()
                .map(|s| s.name.clone())
                .collect(),
            speaks_english: therapist.speaks_english,
            time_slot_id,
        }
    }
}

/// Maximal interval over which the set of bookable therapists is constant;
/// the engine's output element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimeRange {
    /// Midnight (UTC) of the day the range starts on.
    pub date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub therapists: Vec<TherapistInfo>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("InvalidSelector: exactly one of specialization or therapistIds is required")]
    InvalidSelector,

    #[error("InvalidDateRange: endDate must not precede startDate")]
    InvalidDateRange,

    #[error("InvalidDateFormat: {0}")]
    InvalidDateFormat(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<shared_database::DatabaseError> for ScheduleError {
    fn from(err: shared_database::DatabaseError) -> Self {
        ScheduleError::DatabaseError(err.to_string())
    }
}

impl From<ScheduleError> for shared_models::AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidSelector
            | ScheduleError::InvalidDateRange
            | ScheduleError::InvalidDateFormat(_) => {
                shared_models::AppError::BadRequest(err.to_string())
            }
            ScheduleError::DatabaseError(msg) => shared_models::AppError::Database(msg),
        }
    }
}
