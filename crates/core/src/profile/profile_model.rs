use serde::{Deserialize, Serialize};

/// Body profile kept by the backend. Every field may be unset for a fresh
/// account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl Profile {
    /// Weight usable for goal computation.
    pub fn usable_weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| w.is_finite() && *w > 0.0)
    }
}
