use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

/// Nested under `/schedule`.
pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::get_schedule))
        .with_state(state)
}
