//! SmartBite Core - reading ingestion and goal tracking.
//!
//! This crate holds the domain model and services of the SmartBite plate
//! monitor. It is transport-agnostic: the REST backend is reached through
//! the [`api::NutritionApi`] trait, implemented by the `api-client` crate,
//! and live samples arrive as raw payloads from the `telemetry` crate.

pub mod api;
pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;
pub mod live_sample;
pub mod preferences;
pub mod profile;
pub mod readings;
pub mod session;
pub mod tracker;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use tracker::{NutritionTracker, TodaySummary, TrackerConfig};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
