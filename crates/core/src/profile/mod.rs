//! Body profile (weight, height, age, gender).

mod profile_model;
mod profile_service;

pub use profile_model::Profile;
pub use profile_service::ProfileService;
