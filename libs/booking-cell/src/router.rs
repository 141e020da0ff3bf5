use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

/// Slot publication and removal, nested under `/schedules`.
pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_schedule))
        .route("/{schedule_id}", delete(handlers::delete_schedule))
        .route(
            "/doctors/{doctor_id}/available",
            get(handlers::get_available_slots),
        )
        .with_state(state)
}

/// Booking and confirmation, nested under `/appointments`.
pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))
        .with_state(state)
}
