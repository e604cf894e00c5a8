//! Reading domain models.

use serde::{Deserialize, Serialize};

use crate::live_sample::LiveSample;

/// A named food and its weight on one plate compartment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FoodPortion {
    pub name: String,
    pub grams: f64,
}

impl FoodPortion {
    pub fn new(name: impl Into<String>, grams: f64) -> Self {
        Self {
            name: name.into(),
            grams,
        }
    }
}

/// One persisted meal measurement. Immutable once created; corrections are
/// new readings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: i64,
    pub user_id: i64,
    pub protein: FoodPortion,
    pub carbohydrate: FoodPortion,
    pub vegetable: FoodPortion,
    /// Backend-assigned ISO timestamp (`YYYY-MM-DDTHH:MM:SS...`).
    pub recorded_at: String,
}

impl Reading {
    pub fn has_valid_weights(&self) -> bool {
        [
            self.protein.grams,
            self.carbohydrate.grams,
            self.vegetable.grams,
        ]
        .iter()
        .all(|g| g.is_finite() && *g >= 0.0)
    }

    /// Whether the reading was taken on the given `YYYY-MM-DD` date.
    pub fn is_on(&self, iso_date: &str) -> bool {
        !iso_date.is_empty() && self.recorded_at.starts_with(iso_date)
    }
}

/// Food names the user picked for the three compartments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FoodNames {
    pub protein: String,
    pub carbohydrate: String,
    pub vegetable: String,
}

impl FoodNames {
    pub fn new(
        protein: impl Into<String>,
        carbohydrate: impl Into<String>,
        vegetable: impl Into<String>,
    ) -> Self {
        Self {
            protein: protein.into(),
            carbohydrate: carbohydrate.into(),
            vegetable: vegetable.into(),
        }
    }
}

/// Registration payload for a new reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReading {
    pub user_id: i64,
    pub protein: FoodPortion,
    pub carbohydrate: FoodPortion,
    pub vegetable: FoodPortion,
}

impl NewReading {
    pub fn from_sample(user_id: i64, names: &FoodNames, sample: &LiveSample) -> Self {
        Self {
            user_id,
            protein: FoodPortion::new(names.protein.clone(), sample.protein),
            carbohydrate: FoodPortion::new(names.carbohydrate.clone(), sample.carbohydrate),
            vegetable: FoodPortion::new(names.vegetable.clone(), sample.vegetable),
        }
    }
}

/// Per-compartment gram totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NutrientTotals {
    pub protein: f64,
    pub carbohydrate: f64,
    pub vegetable: f64,
}

impl NutrientTotals {
    pub fn add(&mut self, reading: &Reading) {
        self.protein += reading.protein.grams;
        self.carbohydrate += reading.carbohydrate.grams;
        self.vegetable += reading.vegetable.grams;
    }
}

/// Which backend listing a store mirrors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingScope {
    /// The session user's own readings.
    #[default]
    Own,
    /// Readings of every user. Kept in its own store, never merged with `Own`.
    AllUsers,
}
