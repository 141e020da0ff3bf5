use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

/// Doctor registration and profile management, nested under `/doctors`.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::register_doctor))
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}", put(handlers::update_doctor))
        .route("/{doctor_id}", delete(handlers::delete_doctor))
        .with_state(state)
}
