// libs/timeslot-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::{AppError, TherapistId, TimeSlotId};

use crate::models::{BulkToggleRequest, CreateTimeSlotRequest, UpdateTimeSlotRequest};
use crate::services::timeslot::TimeSlotService;

#[axum::debug_handler]
pub async fn create_time_slot(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
    Json(request): Json<CreateTimeSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    let slot = service
        .create_slot(&TherapistId::from_string(therapist_id), request)
        .await?;

    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn update_time_slot(
    State(state): State<Arc<AppConfig>>,
    Path((therapist_id, slot_id)): Path<(String, String)>,
    Json(request): Json<UpdateTimeSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    let slot = service
        .update_slot(
            &TherapistId::from_string(therapist_id),
            &TimeSlotId::from_string(slot_id),
            request,
        )
        .await?;

    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn delete_time_slot(
    State(state): State<Arc<AppConfig>>,
    Path((therapist_id, slot_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    service
        .delete_slot(
            &TherapistId::from_string(therapist_id),
            &TimeSlotId::from_string(slot_id),
        )
        .await?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn get_time_slot(
    State(state): State<Arc<AppConfig>>,
    Path((therapist_id, slot_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    let slot = service
        .get_slot(
            &TherapistId::from_string(therapist_id),
            &TimeSlotId::from_string(slot_id),
        )
        .await?;

    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn list_time_slots(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    let slots = service
        .list_slots(&TherapistId::from_string(therapist_id))
        .await?;

    Ok(Json(json!({
        "timeSlots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn bulk_toggle_time_slots(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
    Json(request): Json<BulkToggleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TimeSlotService::from_config(&state);

    let updated = service
        .bulk_toggle(&TherapistId::from_string(therapist_id), request)
        .await?;

    Ok(Json(json!({ "updated": updated })))
}
