use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{DoctorError, RegisterDoctorRequest, UpdateDoctorRequest};
use crate::services::doctor::DoctorService;

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::AccountConflict => {
            AppError::Conflict("Username or email already registered".to_string())
        }
        DoctorError::LicenceConflict => {
            AppError::Conflict("Licence number already registered".to_string())
        }
        DoctorError::SpecialtyNotFound => {
            AppError::BadRequest("One or more specialties do not exist".to_string())
        }
        DoctorError::ValidationError(msg) => AppError::BadRequest(msg),
        DoctorError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = DoctorService::new(&state);

    let doctor = service.register(request).await.map_err(map_doctor_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "doctor": doctor,
            "message": "Doctor registered"
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    let doctors = service.list().await.map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    let doctor = service.get(doctor_id).await.map_err(map_doctor_error)?;

    Ok(Json(json!({ "doctor": doctor })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    let doctor = service
        .update(doctor_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor profile updated"
    })))
}

/// Removing a doctor takes every dependent row with it: appointments and
/// schedules through the booking ledger, then specialty links, the profile,
/// and finally the account.
#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    service.delete(doctor_id).await.map_err(map_doctor_error)?;

    Ok(Json(json!({ "success": true })))
}
