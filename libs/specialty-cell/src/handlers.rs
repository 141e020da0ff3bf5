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

use crate::models::{CreateSpecialtyRequest, SpecialtyError};
use crate::services::catalog::SpecialtyCatalog;

fn map_specialty_error(err: SpecialtyError) -> AppError {
    match err {
        SpecialtyError::NotFound => AppError::NotFound("Specialty not found".to_string()),
        SpecialtyError::DuplicateName => {
            AppError::Conflict("A specialty with this name already exists".to_string())
        }
        SpecialtyError::ValidationError(msg) => AppError::BadRequest(msg),
        SpecialtyError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let catalog = SpecialtyCatalog::new(&state);

    let specialties = catalog.list().await.map_err(map_specialty_error)?;

    Ok(Json(json!({
        "specialties": specialties,
        "total": specialties.len()
    })))
}

#[axum::debug_handler]
pub async fn get_specialty(
    State(state): State<Arc<AppConfig>>,
    Path(specialty_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = SpecialtyCatalog::new(&state);

    let details = catalog
        .detail(specialty_id)
        .await
        .map_err(map_specialty_error)?;

    Ok(Json(json!({
        "specialty": details.specialty,
        "doctors": details.doctors
    })))
}

#[axum::debug_handler]
pub async fn create_specialty(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateSpecialtyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let catalog = SpecialtyCatalog::new(&state);

    let specialty = catalog.create(request).await.map_err(map_specialty_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "specialty": specialty
        })),
    ))
}
