use serde::{Deserialize, Serialize};

/// A scalar supplied by an API client. Clients are inconsistent about
/// sending numbers as JSON numbers or as strings, and about omitting
/// fields entirely, so every request field is one of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionRequest {
    pub manufacturer: FieldValue,
    pub model: FieldValue,
    pub year: FieldValue,
    pub transmission: FieldValue,
    pub mileage: FieldValue,
    pub fuel_type: FieldValue,
    pub engine_size: FieldValue,
}

/// Fully populated prediction payload. Consumers never need null-checks
/// on any of these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub predicted_price: f64,
    pub price_tier: String,
    pub high_price_probability: f64,
    pub regression_model: String,
    pub classification_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub message: Option<String>,
    pub data: Option<PredictionOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service_status: String,
    pub models_status: String,
    pub timestamp: f64,
}
