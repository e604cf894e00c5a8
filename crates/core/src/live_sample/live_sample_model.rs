use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Weight triple currently reported by the plate, not yet saved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveSample {
    pub protein: f64,
    pub carbohydrate: f64,
    pub vegetable: f64,
}

impl LiveSample {
    pub fn new(protein: f64, carbohydrate: f64, vegetable: f64) -> Self {
        Self {
            protein,
            carbohydrate,
            vegetable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.protein == 0.0 && self.carbohydrate == 0.0 && self.vegetable == 0.0
    }
}

/// Wire shape published by the plate on the sensor topic.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamplePayload {
    peso_proteina: f64,
    peso_carbohidrato: f64,
    peso_vegetal: f64,
}

/// Decode a telemetry payload. All three weights must be present, numeric,
/// finite and non-negative.
pub fn parse_sample_payload(payload: &[u8]) -> Result<LiveSample> {
    let decoded: SamplePayload = serde_json::from_slice(payload)
        .map_err(|e| Error::Parse(format!("Invalid plate payload: {}", e)))?;

    let fields = [
        ("pesoProteina", decoded.peso_proteina),
        ("pesoCarbohidrato", decoded.peso_carbohidrato),
        ("pesoVegetal", decoded.peso_vegetal),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::Parse(format!(
                "Field '{}' must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    Ok(LiveSample::new(
        decoded.peso_proteina,
        decoded.peso_carbohidrato,
        decoded.peso_vegetal,
    ))
}
