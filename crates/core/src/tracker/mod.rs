//! The pipeline facade tying session, readings, live sample and goals.

mod tracker_service;


pub use tracker_service::{NutritionTracker, TodaySummary, TrackerConfig};
