//! Goals domain models.

use serde::{Deserialize, Serialize};

/// The user's stated weight objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Gain,
    Lose,
    #[default]
    Maintain,
}

impl Objective {
    /// Key persisted in the preference store, shared with the mobile client.
    pub fn as_key(&self) -> &'static str {
        match self {
            Objective::Gain => "subir",
            Objective::Lose => "bajar",
            Objective::Maintain => "mantener",
        }
    }

    /// Lenient parse: accepts the persisted keys and the English names.
    /// Anything unrecognised falls back to `Maintain`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "subir" | "gain" => Objective::Gain,
            "bajar" | "lose" => Objective::Lose,
            _ => Objective::Maintain,
        }
    }
}

impl From<&str> for Objective {
    fn from(value: &str) -> Self {
        Objective::parse(value)
    }
}

/// Daily gram targets for the three plate compartments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DailyGoal {
    pub protein_g: i64,
    pub carbohydrate_g: i64,
    pub vegetable_g: i64,
}

/// Goal completion per compartment, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub protein: f64,
    pub carbohydrate: f64,
    pub vegetable: f64,
}

/// Objective and goal cached for a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedGoal {
    pub objective: Objective,
    pub goal: DailyGoal,
}
