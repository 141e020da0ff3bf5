pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    DoctorDetails, DoctorError, DoctorProfile, RegisterDoctorRequest, UpdateDoctorRequest,
};
pub use router::doctor_routes;
pub use services::DoctorService;
