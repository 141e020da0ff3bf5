use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use booking_cell::services::ledger::BookingLedger;
use shared_config::AppConfig;
use shared_database::supabase::{DbError, SupabaseClient};
use shared_models::account::Account;
use shared_models::specialty::Specialty;

use crate::models::{
    DoctorDetails, DoctorError, DoctorProfile, RegisterDoctorRequest, UpdateDoctorRequest,
};

#[derive(Debug, Deserialize)]
struct SpecialtyLink {
    doctor_id: Uuid,
    specialty_id: Uuid,
}

pub struct DoctorService {
    supabase: SupabaseClient,
    ledger: BookingLedger,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            ledger: BookingLedger::new(config),
        }
    }

    /// Create the account row, then the profile row, then the specialty
    /// links. Later steps failing take the earlier rows back out, so a failed
    /// registration leaves nothing behind.
    pub async fn register(
        &self,
        request: RegisterDoctorRequest,
    ) -> Result<DoctorDetails, DoctorError> {
        debug!("Registering doctor account for {}", request.username);
        validate_registration(&request)?;

        let specialties = self.resolve_specialties(&request.specialty_ids).await?;

        let account = self.insert_account(&request).await?;

        let profile = match self.insert_profile(account.id, &request).await {
            Ok(profile) => profile,
            Err(err) => {
                self.discard_account(account.id).await;
                return Err(err);
            }
        };

        if !request.specialty_ids.is_empty() {
            if let Err(err) = self
                .link_specialties(profile.id, &request.specialty_ids)
                .await
            {
                self.discard_profile(profile.id).await;
                self.discard_account(account.id).await;
                return Err(err);
            }
        }

        info!(
            "Doctor {} registered (account {}, licence {})",
            profile.id, account.id, profile.licence_number
        );

        Ok(DoctorDetails {
            profile,
            account,
            specialties,
        })
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<DoctorDetails, DoctorError> {
        let profile = self.get_profile(doctor_id).await?;
        let account = self.get_account(profile.account_id).await?;
        let specialties = self.specialties_of(doctor_id).await?;

        Ok(DoctorDetails {
            profile,
            account,
            specialties,
        })
    }

    /// All doctors, ordered by city then hospital. Accounts and specialties
    /// are fetched in bulk and stitched together here rather than per row.
    pub async fn list(&self) -> Result<Vec<DoctorDetails>, DoctorError> {
        let profiles: Vec<DoctorProfile> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/doctor_profiles?order=city.asc,hospital.asc",
                None,
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let account_list = profiles
            .iter()
            .map(|p| p.account_id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let accounts: Vec<Account> = self
            .supabase
            .request(
                Method::GET,
                &format!("/rest/v1/accounts?id=in.({})", account_list),
                None,
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
        let accounts_by_id: HashMap<Uuid, Account> =
            accounts.into_iter().map(|a| (a.id, a)).collect();

        let profile_list = profiles
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let links: Vec<SpecialtyLink> = self
            .supabase
            .request(
                Method::GET,
                &format!(
                    "/rest/v1/doctor_specialties?doctor_id=in.({})",
                    profile_list
                ),
                None,
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let specialty_ids: BTreeSet<Uuid> = links.iter().map(|l| l.specialty_id).collect();
        let specialties_by_id: HashMap<Uuid, Specialty> = if specialty_ids.is_empty() {
            HashMap::new()
        } else {
            let specialty_list = specialty_ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let specialties: Vec<Specialty> = self
                .supabase
                .request(
                    Method::GET,
                    &format!("/rest/v1/specialties?id=in.({})", specialty_list),
                    None,
                )
                .await
                .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
            specialties.into_iter().map(|s| (s.id, s)).collect()
        };

        let mut details = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let account = accounts_by_id
                .get(&profile.account_id)
                .cloned()
                .ok_or_else(|| {
                    DoctorError::DatabaseError(format!(
                        "account {} missing for profile {}",
                        profile.account_id, profile.id
                    ))
                })?;

            let mut specialties: Vec<Specialty> = links
                .iter()
                .filter(|l| l.doctor_id == profile.id)
                .filter_map(|l| specialties_by_id.get(&l.specialty_id).cloned())
                .collect();
            specialties.sort_by(|a, b| a.name.cmp(&b.name));

            details.push(DoctorDetails {
                profile,
                account,
                specialties,
            });
        }

        Ok(details)
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<DoctorDetails, DoctorError> {
        debug!("Updating doctor profile {}", doctor_id);
        self.get_profile(doctor_id).await?;

        if let Some(ref ids) = request.specialty_ids {
            self.resolve_specialties(ids).await?;
            self.replace_specialty_links(doctor_id, ids).await?;
        }

        let mut update_data = serde_json::Map::new();
        if let Some(licence) = request.licence_number {
            update_data.insert("licence_number".to_string(), json!(licence));
        }
        if let Some(city) = request.city {
            update_data.insert("city".to_string(), json!(city));
        }
        if let Some(hospital) = request.hospital {
            update_data.insert("hospital".to_string(), json!(hospital));
        }

        if !update_data.is_empty() {
            update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

            let path = format!("/rest/v1/doctor_profiles?id=eq.{}", doctor_id);
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                "Prefer",
                reqwest::header::HeaderValue::from_static("return=representation"),
            );

            let updated: Vec<DoctorProfile> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(Value::Object(update_data)),
                    Some(headers),
                )
                .await
                .map_err(|e| match e {
                    DbError::Conflict(_) => DoctorError::LicenceConflict,
                    other => DoctorError::DatabaseError(other.to_string()),
                })?;

            if updated.is_empty() {
                return Err(DoctorError::NotFound);
            }
        }

        self.get(doctor_id).await
    }

    /// Take a doctor out of the system entirely. Ledger rows go first, then
    /// specialty links, then the profile, and the identity row last, so every
    /// step only ever removes rows nothing else points at anymore.
    pub async fn delete(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let profile = self.get_profile(doctor_id).await?;

        self.ledger
            .delete_for_doctor(doctor_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let links_path = format!("/rest/v1/doctor_specialties?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request_no_content(Method::DELETE, &links_path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let profile_path = format!("/rest/v1/doctor_profiles?id=eq.{}", doctor_id);
        self.supabase
            .request_no_content(Method::DELETE, &profile_path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let account_path = format!("/rest/v1/accounts?id=eq.{}", profile.account_id);
        self.supabase
            .request_no_content(Method::DELETE, &account_path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        info!(
            "Doctor {} and account {} removed",
            doctor_id, profile.account_id
        );
        Ok(())
    }

    async fn get_profile(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let path = format!("/rest/v1/doctor_profiles?id=eq.{}", doctor_id);
        let result: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Account, DoctorError> {
        let path = format!("/rest/v1/accounts?id=eq.{}", account_id);
        let result: Vec<Account> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or_else(|| {
            DoctorError::DatabaseError(format!("account {} missing", account_id))
        })
    }

    /// Resolve specialty ids to rows, name-ordered. Every id must exist.
    async fn resolve_specialties(&self, ids: &[Uuid]) -> Result<Vec<Specialty>, DoctorError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let unique: BTreeSet<Uuid> = ids.iter().copied().collect();
        let list = unique
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/specialties?id=in.({})&order=name.asc", list);

        let specialties: Vec<Specialty> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if specialties.len() != unique.len() {
            return Err(DoctorError::SpecialtyNotFound);
        }

        Ok(specialties)
    }

    async fn insert_account(
        &self,
        request: &RegisterDoctorRequest,
    ) -> Result<Account, DoctorError> {
        let body = json!({
            "username": request.username,
            "email": request.email,
            "first_name": request.first_name,
            "last_name": request.last_name
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<Account> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/accounts", Some(body), Some(headers))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => DoctorError::AccountConflict,
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("empty insert response".to_string()))
    }

    async fn insert_profile(
        &self,
        account_id: Uuid,
        request: &RegisterDoctorRequest,
    ) -> Result<DoctorProfile, DoctorError> {
        let body = json!({
            "account_id": account_id,
            "licence_number": request.licence_number,
            "city": request.city,
            "hospital": request.hospital
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<DoctorProfile> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_profiles",
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => DoctorError::LicenceConflict,
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("empty insert response".to_string()))
    }

    async fn link_specialties(&self, doctor_id: Uuid, ids: &[Uuid]) -> Result<(), DoctorError> {
        let rows: Vec<Value> = ids
            .iter()
            .map(|sid| json!({ "doctor_id": doctor_id, "specialty_id": sid }))
            .collect();

        self.supabase
            .request_no_content(
                Method::POST,
                "/rest/v1/doctor_specialties",
                Some(Value::Array(rows)),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn replace_specialty_links(
        &self,
        doctor_id: Uuid,
        ids: &[Uuid],
    ) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/doctor_specialties?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request_no_content(Method::DELETE, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if ids.is_empty() {
            return Ok(());
        }

        self.link_specialties(doctor_id, ids).await
    }

    async fn specialties_of(&self, doctor_id: Uuid) -> Result<Vec<Specialty>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_specialties?doctor_id=eq.{}&select=specialty_id",
            doctor_id
        );
        let links: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let ids: Vec<Uuid> = links
            .iter()
            .filter_map(|l| l["specialty_id"].as_str())
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/specialties?id=in.({})&order=name.asc", list);
        let specialties: Vec<Specialty> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(specialties)
    }

    /// Best-effort rollbacks for partial registrations.
    async fn discard_account(&self, account_id: Uuid) {
        let path = format!("/rest/v1/accounts?id=eq.{}", account_id);
        if let Err(e) = self
            .supabase
            .request_no_content(Method::DELETE, &path, None)
            .await
        {
            warn!(
                "Failed to discard account {} after registration error: {}",
                account_id, e
            );
        }
    }

    async fn discard_profile(&self, profile_id: Uuid) {
        let path = format!("/rest/v1/doctor_profiles?id=eq.{}", profile_id);
        if let Err(e) = self
            .supabase
            .request_no_content(Method::DELETE, &path, None)
            .await
        {
            warn!(
                "Failed to discard profile {} after registration error: {}",
                profile_id, e
            );
        }
    }
}

fn validate_registration(request: &RegisterDoctorRequest) -> Result<(), DoctorError> {
    let required = [
        ("username", &request.username),
        ("email", &request.email),
        ("first_name", &request.first_name),
        ("last_name", &request.last_name),
        ("licence_number", &request.licence_number),
        ("city", &request.city),
        ("hospital", &request.hospital),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DoctorError::ValidationError(format!(
                "{} must not be empty",
                field
            )));
        }
    }

    Ok(())
}
