use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::DoctorProfile;
use shared_models::specialty::Specialty;

/// Catalog entry together with the doctors practising it, the shape the
/// detail endpoint hands out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyDetails {
    pub specialty: Specialty,
    pub doctors: Vec<DoctorProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialtyRequest {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum SpecialtyError {
    #[error("Specialty not found")]
    NotFound,

    #[error("A specialty with this name already exists")]
    DuplicateName,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
