//! SmartBite REST client.
//!
//! Implements [`smartbite_core::api::NutritionApi`] over HTTP with `reqwest`.

pub mod client;
pub mod error;
pub mod types;

pub use client::SmartBiteClient;
pub use error::{ApiError, Result};
