// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::AppError;

use crate::models::{ScheduleError, ScheduleQuery};
use crate::services::availability::ScheduleService;
use crate::services::pool::{parse_selector, resolve_window};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQueryParams {
    pub specialization: Option<String>,
    /// Comma-separated therapist ids.
    pub therapist_ids: Option<String>,
    pub requires_english: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<ScheduleQueryParams>,
) -> Result<Json<Value>, AppError> {
    let query = build_query(params)?;

    let service = ScheduleService::from_config(&state);
    let availabilities = service.compute_availability(&query).await?;

    Ok(Json(json!({ "availabilities": availabilities })))
}

fn build_query(params: ScheduleQueryParams) -> Result<ScheduleQuery, ScheduleError> {
    let therapist_ids = params.therapist_ids.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    let selector = parse_selector(params.specialization, therapist_ids)?;
    let (start_date, end_date) = resolve_window(
        parse_date(params.start_date.as_deref())?,
        parse_date(params.end_date.as_deref())?,
    )?;

    Ok(ScheduleQuery {
        selector,
        requires_english: params.requires_english.unwrap_or(false),
        start_date,
        end_date,
    })
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ScheduleError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| ScheduleError::InvalidDateFormat(format!("expected YYYY-MM-DD, got {value:?}")))
    })
    .transpose()
}
