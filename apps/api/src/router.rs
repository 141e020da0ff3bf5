use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use booking_cell::router::{appointment_routes, schedule_routes};
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use specialty_cell::router::specialty_routes;

use crate::stats;

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let overview = Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats::get_stats))
        .with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .merge(overview)
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/specialties", specialty_routes(state))
}
