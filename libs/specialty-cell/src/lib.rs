pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CreateSpecialtyRequest, SpecialtyDetails, SpecialtyError};
pub use router::specialty_routes;
pub use services::SpecialtyCatalog;
