pub mod account;
pub mod error;
pub mod specialty;

pub use account::Account;
pub use error::AppError;
pub use specialty::Specialty;
