use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{BookSlotRequest, BookingError, CreateScheduleRequest};
use crate::services::ledger::BookingLedger;

/// The acting doctor is carried explicitly; there is no session to read it
/// from.
#[derive(Debug, Deserialize)]
pub struct DeleteScheduleQuery {
    pub doctor_id: Uuid,
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let ledger = BookingLedger::new(&state);

    let schedule = ledger.create_schedule(request).await.map_err(|e| match e {
        BookingError::DuplicateSlot => {
            AppError::Conflict("A slot for this date and timeslot already exists".to_string())
        }
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::ValidationError(msg) => AppError::BadRequest(msg),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "schedule": schedule,
            "message": "Schedule slot published"
        })),
    ))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<DeleteScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let ledger = BookingLedger::new(&state);

    ledger
        .delete_schedule(schedule_id, query.doctor_id)
        .await
        .map_err(|e| match e {
            BookingError::SlotNotFound => {
                AppError::NotFound("Schedule slot not found".to_string())
            }
            BookingError::NotOwner => {
                AppError::Forbidden("Schedule slot belongs to a different doctor".to_string())
            }
            BookingError::BookedSlotDeletionDisabled => {
                AppError::Conflict("This slot is booked and cannot be deleted".to_string())
            }
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ledger = BookingLedger::new(&state);

    let slots = ledger
        .list_available_slots(doctor_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "available_slots": slots,
        "total": slots.len()
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let ledger = BookingLedger::new(&state);

    let appointment = ledger.book_slot(request).await.map_err(|e| match e {
        BookingError::SlotNotFound => AppError::NotFound("Schedule slot not found".to_string()),
        BookingError::SlotAlreadyBooked => {
            AppError::Conflict("This slot is no longer available, please pick another".to_string())
        }
        BookingError::ValidationError(msg) => AppError::BadRequest(msg),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ledger = BookingLedger::new(&state);

    let appointment = ledger
        .get_appointment(appointment_id)
        .await
        .map_err(|e| match e {
            BookingError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ledger = BookingLedger::new(&state);

    let appointments = ledger
        .list_appointments(doctor_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}
