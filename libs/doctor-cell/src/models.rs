use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::account::Account;
use shared_models::specialty::Specialty;

// ==============================================================================
// CORE DOCTOR MODELS
// ==============================================================================

/// Professional half of a doctor's record. Identity lives on the linked
/// account row; this row never duplicates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub licence_number: String,
    pub city: String,
    pub hospital: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile joined with its account and specialty names, the shape the API
/// hands out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub profile: DoctorProfile,
    pub account: Account,
    pub specialties: Vec<Specialty>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDoctorRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub licence_number: String,
    pub city: String,
    pub hospital: String,
    #[serde(default)]
    pub specialty_ids: Vec<Uuid>,
}

/// Partial update; absent fields keep their stored value. Supplying
/// `specialty_ids` replaces the whole specialty set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub licence_number: Option<String>,
    pub city: Option<String>,
    pub hospital: Option<String>,
    pub specialty_ids: Option<Vec<Uuid>>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Username or email already registered")]
    AccountConflict,

    #[error("Licence number already registered")]
    LicenceConflict,

    #[error("One or more specialties do not exist")]
    SpecialtyNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
