pub mod catalog;

pub use catalog::SpecialtyCatalog;
