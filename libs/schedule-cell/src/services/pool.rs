// libs/schedule-cell/src/services/pool.rs
use chrono::{NaiveDate, Utc};
use tracing::debug;

use therapist_cell::models::Therapist;
use therapist_cell::repository::TherapistRepository;

use crate::models::{PoolSelector, ScheduleError};

/// Days covered when the query names no window: today through today + 6.
const DEFAULT_WINDOW_DAYS: i64 = 6;

/// Validates the selector pair: exactly one of the two must be present.
pub fn parse_selector(
    specialization: Option<String>,
    therapist_ids: Option<Vec<String>>,
) -> Result<PoolSelector, ScheduleError> {
    match (specialization, therapist_ids) {
        (Some(tag), None) if !tag.is_empty() => Ok(PoolSelector::Specialization(tag)),
        (None, Some(ids)) if !ids.is_empty() => Ok(PoolSelector::TherapistIds(
            ids.into_iter().map(|id| id.as_str().into()).collect(),
        )),
        _ => Err(ScheduleError::InvalidSelector),
    }
}

/// Resolves the inclusive date window. A missing bound falls back to the
/// present one; with neither given, the default window starts today (UTC).
pub fn resolve_window(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), ScheduleError> {
    let today = Utc::now().date_naive();

    let (start, end) = match (start_date, end_date) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start),
        (None, Some(end)) => (end, end),
        (None, None) => (today, today + chrono::Duration::days(DEFAULT_WINDOW_DAYS)),
    };

    if start > end {
        return Err(ScheduleError::InvalidDateRange);
    }

    Ok((start, end))
}

/// Selects the therapist pool for a schedule query. An empty pool is not an
/// error; the engine answers it with an empty availabilities list.
pub async fn select_pool(
    therapists: &dyn TherapistRepository,
    selector: &PoolSelector,
    requires_english: bool,
) -> Result<Vec<Therapist>, ScheduleError> {
    let pool = match selector {
        PoolSelector::Specialization(tag) => {
            therapists
                .find_by_specialization(tag.clone(), requires_english)
                .await?
        }
        PoolSelector::TherapistIds(ids) => {
            let mut found = therapists.find_by_ids(ids.clone()).await?;
            if requires_english {
                found.retain(|therapist| therapist.speaks_english);
            }
            found
        }
    };

    debug!("Selected pool of {} therapists", pool.len());
    Ok(pool)
}
