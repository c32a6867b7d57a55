use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::{
    booking_routes, client_listing_routes, session_routes, therapist_listing_routes,
};
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;
use timeslot_cell::router::time_slot_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Therapy booking API is running!" }))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/sessions", session_routes(state.clone()))
        .nest(
            "/therapists/{therapist_id}/timeslots",
            time_slot_routes(state.clone()),
        )
        .nest(
            "/therapists/{therapist_id}",
            therapist_listing_routes(state.clone()),
        )
        .nest("/clients/{client_id}", client_listing_routes(state.clone()))
}
