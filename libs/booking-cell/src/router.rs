use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

/// Nested under `/bookings`.
pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_booking))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/confirm", post(handlers::confirm_booking))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .with_state(state)
}

/// Nested under `/sessions`.
pub fn session_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{session_id}", get(handlers::get_session))
        .route("/{session_id}/state", patch(handlers::update_session_state))
        .route("/{session_id}/notes", post(handlers::append_session_notes))
        .route("/{session_id}/meeting-url", patch(handlers::update_session_meeting_url))
        .with_state(state)
}

/// Listings by practitioner, nested under `/therapists/{therapist_id}`.
pub fn therapist_listing_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/bookings", get(handlers::list_bookings_by_therapist))
        .route("/sessions", get(handlers::list_sessions_by_therapist))
        .with_state(state)
}

/// Listings by booker, nested under `/clients/{client_id}`.
pub fn client_listing_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/bookings", get(handlers::list_bookings_by_client))
        .route("/sessions", get(handlers::list_sessions_by_client))
        .with_state(state)
}
