use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Medical specialty catalog entry. Doctors link to these through the
/// `doctor_specialties` join table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
}
