use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Json};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::AppError;

/// Index-page counters: doctors, specialties, appointments and distinct
/// patients across the whole system.
struct OverviewService {
    supabase: SupabaseClient,
}

impl OverviewService {
    fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn count(&self, table: &str) -> Result<u64, AppError> {
        let path = format!("/rest/v1/{}?select=count", table);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Patients have no table of their own; two appointments belong to the
    /// same patient when they carry the same insurance number.
    async fn distinct_patients(&self) -> Result<u64, AppError> {
        let rows: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/appointments?select=insurance_number",
                None,
            )
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let patients: HashSet<&str> = rows
            .iter()
            .filter_map(|row| row["insurance_number"].as_str())
            .collect();

        Ok(patients.len() as u64)
    }
}

pub async fn get_stats(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = OverviewService::new(&state);

    let (doctors, specialties, appointments, patients) = futures::try_join!(
        service.count("doctor_profiles"),
        service.count("specialties"),
        service.count("appointments"),
        service.distinct_patients(),
    )?;

    debug!(
        "Overview: {} doctors, {} specialties, {} appointments, {} patients",
        doctors, specialties, appointments, patients
    );

    Ok(Json(json!({
        "doctors": doctors,
        "specialties": specialties,
        "appointments": appointments,
        "patients": patients
    })))
}
