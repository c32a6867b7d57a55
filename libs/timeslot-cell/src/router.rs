use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

/// Nested under `/therapists/{therapist_id}/timeslots`.
pub fn time_slot_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_time_slot).get(handlers::list_time_slots))
        .route(
            "/{slot_id}",
            get(handlers::get_time_slot)
                .put(handlers::update_time_slot)
                .delete(handlers::delete_time_slot),
        )
        .route("/toggle", patch(handlers::bulk_toggle_time_slots))
        .with_state(state)
}
