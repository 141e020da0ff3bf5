pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, BookSlotRequest, BookingError, CreateScheduleRequest, DoctorSchedule, TimeSlot,
};
pub use router::{appointment_routes, schedule_routes};
pub use services::BookingLedger;
