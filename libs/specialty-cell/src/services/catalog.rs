use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use doctor_cell::models::DoctorProfile;
use shared_config::AppConfig;
use shared_database::supabase::{DbError, SupabaseClient};
use shared_models::specialty::Specialty;

use crate::models::{CreateSpecialtyRequest, SpecialtyDetails, SpecialtyError};

/// Read-mostly catalog of medical specialties.
pub struct SpecialtyCatalog {
    supabase: SupabaseClient,
}

impl SpecialtyCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Every specialty, alphabetically.
    pub async fn list(&self) -> Result<Vec<Specialty>, SpecialtyError> {
        let specialties: Vec<Specialty> = self
            .supabase
            .request(Method::GET, "/rest/v1/specialties?order=name.asc", None)
            .await
            .map_err(|e| SpecialtyError::DatabaseError(e.to_string()))?;

        Ok(specialties)
    }

    /// One specialty plus the doctors practising it, assembled from the join
    /// table and a bulk profile fetch.
    pub async fn detail(&self, specialty_id: Uuid) -> Result<SpecialtyDetails, SpecialtyError> {
        let path = format!("/rest/v1/specialties?id=eq.{}", specialty_id);
        let rows: Vec<Specialty> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SpecialtyError::DatabaseError(e.to_string()))?;

        let specialty = rows.into_iter().next().ok_or(SpecialtyError::NotFound)?;

        let links_path = format!(
            "/rest/v1/doctor_specialties?specialty_id=eq.{}&select=doctor_id",
            specialty_id
        );
        let links: Vec<Value> = self
            .supabase
            .request(Method::GET, &links_path, None)
            .await
            .map_err(|e| SpecialtyError::DatabaseError(e.to_string()))?;

        let doctor_ids: Vec<Uuid> = links
            .iter()
            .filter_map(|l| l["doctor_id"].as_str())
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();

        let doctors = if doctor_ids.is_empty() {
            Vec::new()
        } else {
            let list = doctor_ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let profiles_path = format!(
                "/rest/v1/doctor_profiles?id=in.({})&order=city.asc,hospital.asc",
                list
            );
            let profiles: Vec<DoctorProfile> = self
                .supabase
                .request(Method::GET, &profiles_path, None)
                .await
                .map_err(|e| SpecialtyError::DatabaseError(e.to_string()))?;
            profiles
        };

        debug!(
            "Specialty {} resolved with {} doctors",
            specialty.name,
            doctors.len()
        );

        Ok(SpecialtyDetails { specialty, doctors })
    }

    pub async fn create(
        &self,
        request: CreateSpecialtyRequest,
    ) -> Result<Specialty, SpecialtyError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SpecialtyError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }

        let body = json!({ "name": name });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<Specialty> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/specialties", Some(body), Some(headers))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => SpecialtyError::DuplicateName,
                other => SpecialtyError::DatabaseError(other.to_string()),
            })?;

        let specialty = created
            .into_iter()
            .next()
            .ok_or_else(|| SpecialtyError::DatabaseError("empty insert response".to_string()))?;

        info!("Specialty {} added to the catalog", specialty.name);
        Ok(specialty)
    }
}
