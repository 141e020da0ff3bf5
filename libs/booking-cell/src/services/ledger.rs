use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{DbError, SupabaseClient};

use crate::models::{
    Appointment, BookSlotRequest, BookingError, CreateScheduleRequest, DoctorSchedule,
};

/// Storage-backed ledger for schedule slots and their bookings. Stateless
/// between calls; every mutation is pushed straight to the database so
/// concurrent handlers only ever contend there.
pub struct BookingLedger {
    supabase: SupabaseClient,
    allow_booked_delete: bool,
}

impl BookingLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            allow_booked_delete: config.allow_booked_schedule_delete,
        }
    }

    /// Open slots for one doctor, soonest first.
    pub async fn list_available_slots(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<DoctorSchedule>, BookingError> {
        debug!("Listing open slots for doctor {}", doctor_id);

        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&is_booked=eq.false&order=date.asc,timeslot.asc",
            doctor_id
        );
        let slots: Vec<DoctorSchedule> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(slots)
    }

    /// Publish a new open slot for a doctor. The database enforces one slot
    /// per (doctor, date, timeslot); a second identical publication comes
    /// back as a conflict and maps to `DuplicateSlot`.
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> Result<DoctorSchedule, BookingError> {
        debug!(
            "Publishing slot {} / {} for doctor {}",
            request.date, request.timeslot, request.doctor_id
        );

        let doctor_path = format!(
            "/rest/v1/doctor_profiles?id=eq.{}&select=id",
            request.doctor_id
        );
        let doctors: Vec<Value> = self
            .supabase
            .request(Method::GET, &doctor_path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if doctors.is_empty() {
            return Err(BookingError::DoctorNotFound);
        }

        let body = json!({
            "doctor_id": request.doctor_id,
            "date": request.date,
            "timeslot": request.timeslot,
            "is_booked": false
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<DoctorSchedule> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_schedules",
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => BookingError::DuplicateSlot,
                other => BookingError::DatabaseError(other.to_string()),
            })?;

        let schedule = created
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::DatabaseError("empty insert response".to_string()))?;

        info!(
            "Slot {} published for doctor {} on {}",
            schedule.id, schedule.doctor_id, schedule.date
        );
        Ok(schedule)
    }

    /// Book an open slot for a patient. Flipping `is_booked` and creating the
    /// appointment happen together or not at all: the flag is claimed with a
    /// filtered update that only matches an unbooked row, and an appointment
    /// insert failure releases the claim again.
    pub async fn book_slot(&self, request: BookSlotRequest) -> Result<Appointment, BookingError> {
        validate_patient_details(&request)?;

        let schedule = self.get_schedule(request.schedule_id).await?;

        if schedule.is_booked {
            return Err(BookingError::SlotAlreadyBooked);
        }

        // The is_booked=eq.false filter and the update run as one statement
        // inside PostgREST, so of N concurrent bookings for this row exactly
        // one gets the row back. Everyone else sees an empty result.
        let claim_path = format!(
            "/rest/v1/doctor_schedules?id=eq.{}&is_booked=eq.false",
            request.schedule_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let claimed: Vec<DoctorSchedule> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &claim_path,
                Some(json!({ "is_booked": true })),
                Some(headers),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if claimed.is_empty() {
            debug!(
                "Slot {} was claimed by a concurrent booking",
                request.schedule_id
            );
            return Err(BookingError::SlotAlreadyBooked);
        }

        match self.insert_appointment(&schedule, &request).await {
            Ok(appointment) => {
                info!(
                    "Appointment {} booked for slot {} ({})",
                    appointment.id, schedule.id, schedule.date
                );
                Ok(appointment)
            }
            // A unique violation on schedule_id means an appointment already
            // holds this slot. The booked flag is then telling the truth and
            // must not be released.
            Err(BookingError::SlotAlreadyBooked) => Err(BookingError::SlotAlreadyBooked),
            Err(err) => {
                self.release_slot(request.schedule_id).await;
                Err(err)
            }
        }
    }

    /// Remove a slot. Only its owner may do so, and the linked appointment
    /// (if any) goes first so an interruption can never leave an appointment
    /// pointing at a missing slot.
    pub async fn delete_schedule(
        &self,
        schedule_id: Uuid,
        requesting_doctor_id: Uuid,
    ) -> Result<(), BookingError> {
        let schedule = self.get_schedule(schedule_id).await?;

        if schedule.doctor_id != requesting_doctor_id {
            debug!(
                "Doctor {} attempted to delete slot {} owned by {}",
                requesting_doctor_id, schedule_id, schedule.doctor_id
            );
            return Err(BookingError::NotOwner);
        }

        if schedule.is_booked && !self.allow_booked_delete {
            return Err(BookingError::BookedSlotDeletionDisabled);
        }

        let appointments_path = format!("/rest/v1/appointments?schedule_id=eq.{}", schedule_id);
        self.supabase
            .request_no_content(Method::DELETE, &appointments_path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let schedule_path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        self.supabase
            .request_no_content(Method::DELETE, &schedule_path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        info!(
            "Slot {} deleted by doctor {} (was booked: {})",
            schedule_id, requesting_doctor_id, schedule.is_booked
        );
        Ok(())
    }

    /// Booking confirmation data.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .ok_or(BookingError::AppointmentNotFound)
    }

    /// All appointments held against one doctor, newest first.
    pub async fn list_appointments(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=created_at.desc",
            doctor_id
        );
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(appointments)
    }

    /// Remove everything the ledger holds for a doctor, appointments before
    /// schedules. Used when a doctor profile is taken down.
    pub async fn delete_for_doctor(&self, doctor_id: Uuid) -> Result<(), BookingError> {
        let appointments_path = format!("/rest/v1/appointments?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request_no_content(Method::DELETE, &appointments_path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let schedules_path = format!("/rest/v1/doctor_schedules?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request_no_content(Method::DELETE, &schedules_path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        info!("Removed all slots and appointments for doctor {}", doctor_id);
        Ok(())
    }

    async fn get_schedule(&self, schedule_id: Uuid) -> Result<DoctorSchedule, BookingError> {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let result: Vec<DoctorSchedule> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(BookingError::SlotNotFound)
    }

    async fn insert_appointment(
        &self,
        schedule: &DoctorSchedule,
        request: &BookSlotRequest,
    ) -> Result<Appointment, BookingError> {
        let body = json!({
            "doctor_id": schedule.doctor_id,
            "schedule_id": schedule.id,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "insurance_number": request.insurance_number,
            "comments": request.comments
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/appointments", Some(body), Some(headers))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => BookingError::SlotAlreadyBooked,
                other => BookingError::DatabaseError(other.to_string()),
            })?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::DatabaseError("empty insert response".to_string()))
    }

    /// Compensation for a failed booking: put the slot back on the market.
    /// Best effort; a failure here leaves the slot unavailable rather than
    /// double-booked, and gets logged for operators.
    async fn release_slot(&self, schedule_id: Uuid) {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let result = self
            .supabase
            .request_no_content(Method::PATCH, &path, Some(json!({ "is_booked": false })))
            .await;

        if let Err(e) = result {
            warn!(
                "Failed to release slot {} after booking error: {}",
                schedule_id, e
            );
        }
    }
}

fn validate_patient_details(request: &BookSlotRequest) -> Result<(), BookingError> {
    let required = [
        ("first_name", &request.first_name),
        ("last_name", &request.last_name),
        ("email", &request.email),
        ("phone", &request.phone),
        ("insurance_number", &request.insurance_number),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(BookingError::ValidationError(format!(
                "{} must not be empty",
                field
            )));
        }
    }

    Ok(())
}
