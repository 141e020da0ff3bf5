use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// TIMESLOT
// ==============================================================================

#[derive(Debug, Error)]
#[error("invalid timeslot ordinal {0}, expected 0-7")]
pub struct InvalidTimeSlot(pub u8);

/// The eight bookable one-hour intervals of a working day. 13:00 to 14:00 is
/// the lunch break and has no ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TimeSlot {
    NineToTen = 0,
    TenToEleven = 1,
    ElevenToTwelve = 2,
    TwelveToThirteen = 3,
    FourteenToFifteen = 4,
    FifteenToSixteen = 5,
    SixteenToSeventeen = 6,
    SeventeenToEighteen = 7,
}

impl TryFrom<u8> for TimeSlot {
    type Error = InvalidTimeSlot;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(TimeSlot::NineToTen),
            1 => Ok(TimeSlot::TenToEleven),
            2 => Ok(TimeSlot::ElevenToTwelve),
            3 => Ok(TimeSlot::TwelveToThirteen),
            4 => Ok(TimeSlot::FourteenToFifteen),
            5 => Ok(TimeSlot::FifteenToSixteen),
            6 => Ok(TimeSlot::SixteenToSeventeen),
            7 => Ok(TimeSlot::SeventeenToEighteen),
            other => Err(InvalidTimeSlot(other)),
        }
    }
}

impl From<TimeSlot> for u8 {
    fn from(slot: TimeSlot) -> u8 {
        slot as u8
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeSlot::NineToTen => "09:00 – 10:00",
            TimeSlot::TenToEleven => "10:00 – 11:00",
            TimeSlot::ElevenToTwelve => "11:00 – 12:00",
            TimeSlot::TwelveToThirteen => "12:00 – 13:00",
            TimeSlot::FourteenToFifteen => "14:00 – 15:00",
            TimeSlot::FifteenToSixteen => "15:00 – 16:00",
            TimeSlot::SixteenToSeventeen => "16:00 – 17:00",
            TimeSlot::SeventeenToEighteen => "17:00 – 18:00",
        };
        write!(f, "{}", label)
    }
}

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

/// One bookable slot published by a doctor. `(doctor_id, date, timeslot)` is
/// unique in storage; `is_booked` flips to true at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub timeslot: TimeSlot,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

/// A confirmed booking. `schedule_id` is unique in storage, so a slot can
/// never hold two appointments even if the booked flag were to drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub schedule_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_number: String,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn patient_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub timeslot: TimeSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub schedule_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_number: String,
    #[serde(default)]
    pub comments: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Schedule slot not found")]
    SlotNotFound,

    #[error("Schedule slot is already booked")]
    SlotAlreadyBooked,

    #[error("Doctor already has a slot for this date and timeslot")]
    DuplicateSlot,

    #[error("Schedule slot belongs to a different doctor")]
    NotOwner,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Deleting booked slots is disabled")]
    BookedSlotDeletionDisabled,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
