use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

/// Specialty catalog browsing and curation, nested under `/specialties`.
pub fn specialty_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_specialties))
        .route("/", post(handlers::create_specialty))
        .route("/{specialty_id}", get(handlers::get_specialty))
        .with_state(state)
}
