// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::{AppError, BookingId, ClientId, SessionId, TherapistId};

use crate::models::{
    AppendNotesRequest, ConfirmBookingRequest, CreateBookingRequest, UpdateMeetingUrlRequest,
    UpdateSessionStateRequest,
};
use crate::services::booking::BookingService;
use crate::services::session::SessionService;

#[derive(Debug, Deserialize)]
pub struct StateFilterQuery {
    pub state: Option<String>,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BookingService::from_config(&state);

    let booking = service.create_booking(request).await?;

    Ok((StatusCode::CREATED, Json(json!(booking))))
}

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<String>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::from_config(&state);

    let confirmed = service
        .confirm_booking(&BookingId::from_string(booking_id), request)
        .await?;

    Ok(Json(json!(confirmed.booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::from_config(&state);

    let booking = service.cancel_booking(&BookingId::from_string(booking_id)).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::from_config(&state);

    let booking = service.get_booking(&BookingId::from_string(booking_id)).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn list_bookings_by_therapist(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
    Query(query): Query<StateFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::from_config(&state);

    let bookings = service
        .list_by_therapist(&TherapistId::from_string(therapist_id), query.state)
        .await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn list_bookings_by_client(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<String>,
    Query(query): Query<StateFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::from_config(&state);

    let bookings = service
        .list_by_client(&ClientId::from_string(client_id), query.state)
        .await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

// ==============================================================================
// SESSION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<Arc<AppConfig>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let session = service.get_session(&SessionId::from_string(session_id)).await?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn update_session_state(
    State(state): State<Arc<AppConfig>>,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateSessionStateRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let session = service
        .update_state(&SessionId::from_string(session_id), request.state)
        .await?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn append_session_notes(
    State(state): State<Arc<AppConfig>>,
    Path(session_id): Path<String>,
    Json(request): Json<AppendNotesRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let session = service
        .append_notes(&SessionId::from_string(session_id), &request.notes)
        .await?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn update_session_meeting_url(
    State(state): State<Arc<AppConfig>>,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateMeetingUrlRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let session = service
        .update_meeting_url(&SessionId::from_string(session_id), &request.meeting_url)
        .await?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn list_sessions_by_therapist(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let sessions = service
        .list_by_therapist(&TherapistId::from_string(therapist_id))
        .await?;

    Ok(Json(json!({
        "sessions": sessions,
        "total": sessions.len()
    })))
}

#[axum::debug_handler]
pub async fn list_sessions_by_client(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::from_config(&state);

    let sessions = service.list_by_client(&ClientId::from_string(client_id)).await?;

    Ok(Json(json!({
        "sessions": sessions,
        "total": sessions.len()
    })))
}
