use std::collections::HashMap;

use shared::{FieldValue, PredictionRequest};

use crate::ml::PredictionError;
use crate::ml::schema::{self, CATEGORICAL_SENTINEL, FeatureKind, NUMERIC_SENTINEL};

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

/// A single-row input for the fitted pipeline: one value per declared
/// feature column, in the declared order. Built fresh per request and
/// discarded after inference.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// Numeric cell looked up by feature name. None when the name is not a
    /// declared numeric column.
    pub fn number(&self, feature: &str) -> Option<f64> {
        match self.values.get(schema::position(feature)?)? {
            FeatureValue::Number(value) => Some(*value),
            FeatureValue::Text(_) => None,
        }
    }

    /// Categorical cell looked up by feature name.
    pub fn text(&self, feature: &str) -> Option<&str> {
        match self.values.get(schema::position(feature)?)? {
            FeatureValue::Text(value) => Some(value.as_str()),
            FeatureValue::Number(_) => None,
        }
    }
}

/// Maps a validated request into the exact feature row the fitted pipeline
/// expects: public names are rebound to internal feature names, values are
/// coerced to the declared kind, absent features take the sentinel, and the
/// output follows the declared column order.
pub fn align(request: &PredictionRequest) -> Result<FeatureVector, PredictionError> {
    let mut values = Vec::with_capacity(schema::FEATURE_COLUMNS.len());
    for column in schema::FEATURE_COLUMNS {
        let supplied = schema::supplied(request, column.name);
        let (field, value) = match supplied {
            Some((field, value)) => (field, Some(value)),
            None => (column.name, None),
        };
        values.push(coerce(column.kind, value, field)?);
    }
    Ok(FeatureVector { values })
}

/// Alignment entry point for named rows (the training path). Columns not in
/// the declared schema are dropped; declared columns absent from the row
/// take the sentinel.
pub fn align_named(row: &HashMap<String, FieldValue>) -> Result<FeatureVector, PredictionError> {
    let mut values = Vec::with_capacity(schema::FEATURE_COLUMNS.len());
    for column in schema::FEATURE_COLUMNS {
        values.push(coerce(column.kind, row.get(column.name), column.name)?);
    }
    Ok(FeatureVector { values })
}

fn coerce(
    kind: FeatureKind,
    value: Option<&FieldValue>,
    field: &str,
) -> Result<FeatureValue, PredictionError> {
    match kind {
        FeatureKind::Numeric => Ok(FeatureValue::Number(coerce_numeric(value, field)?)),
        FeatureKind::Categorical => Ok(FeatureValue::Text(coerce_categorical(value))),
    }
}

fn coerce_numeric(value: Option<&FieldValue>, field: &str) -> Result<f64, PredictionError> {
    let number = match value {
        None | Some(FieldValue::Missing) => NUMERIC_SENTINEL,
        Some(FieldValue::Number(number)) => *number,
        // Strings get one full-precision parse attempt ("2.5" -> 2.5);
        // anything unparsable falls back to the sentinel.
        Some(FieldValue::Text(raw)) => raw.trim().parse::<f64>().unwrap_or(NUMERIC_SENTINEL),
    };
    if number.is_infinite() {
        return Err(PredictionError::InvalidInput {
            field: field.to_string(),
            reason: "value is not a finite number".to_string(),
        });
    }
    Ok(number)
}

fn coerce_categorical(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Missing) => CATEGORICAL_SENTINEL.to_string(),
        Some(FieldValue::Text(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                CATEGORICAL_SENTINEL.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Some(FieldValue::Number(number)) => {
            if number.is_finite() {
                format!("{}", number)
            } else {
                CATEGORICAL_SENTINEL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> PredictionRequest {
        PredictionRequest {
            manufacturer: "Toyota".into(),
            model: "Camry".into(),
            year: 2022.0.into(),
            transmission: "Automatic".into(),
            mileage: 15000.0.into(),
            fuel_type: "Petrol".into(),
            engine_size: 2.5.into(),
        }
    }

    #[test]
    fn aligned_vector_has_every_declared_column_in_order() {
        let vector = align(&full_request()).unwrap();
        assert_eq!(vector.len(), schema::FEATURE_COLUMNS.len());
        assert_eq!(vector.text("brand"), Some("Toyota"));
        assert_eq!(vector.text("model"), Some("Camry"));
        assert_eq!(vector.number("year"), Some(2022.0));
        assert_eq!(vector.text("transmission"), Some("Automatic"));
        assert_eq!(vector.number("mileage_km"), Some(15000.0));
        assert_eq!(vector.text("fuel"), Some("Petrol"));
        assert_eq!(vector.number("engine_capacity_cc"), Some(2.5));
    }

    #[test]
    fn unmapped_columns_take_the_numeric_sentinel() {
        let vector = align(&full_request()).unwrap();
        assert!(vector.number("horsepower_hp").unwrap().is_nan());
        assert!(vector.number("seats").unwrap().is_nan());
        assert!(vector.number("top_speed_kmh").unwrap().is_nan());
    }

    #[test]
    fn missing_engine_size_becomes_the_sentinel_without_error() {
        let mut request = full_request();
        request.engine_size = FieldValue::Missing;
        let vector = align(&request).unwrap();
        assert!(vector.number("engine_capacity_cc").unwrap().is_nan());
    }

    #[test]
    fn empty_fuel_type_maps_to_the_missing_category() {
        let mut request = full_request();
        request.fuel_type = "".into();
        let vector = align(&request).unwrap();
        assert_eq!(vector.text("fuel"), Some(CATEGORICAL_SENTINEL));

        request.fuel_type = "   ".into();
        let vector = align(&request).unwrap();
        assert_eq!(vector.text("fuel"), Some(CATEGORICAL_SENTINEL));
    }

    #[test]
    fn numeric_strings_parse_at_full_precision() {
        let mut request = full_request();
        request.engine_size = "2.5".into();
        let vector = align(&request).unwrap();
        assert_eq!(vector.number("engine_capacity_cc"), Some(2.5));

        request.engine_size = "not a number".into();
        let vector = align(&request).unwrap();
        assert!(vector.number("engine_capacity_cc").unwrap().is_nan());
    }

    #[test]
    fn non_finite_numeric_input_is_rejected_naming_the_field() {
        let mut request = full_request();
        request.mileage = f64::INFINITY.into();
        match align(&request) {
            Err(PredictionError::InvalidInput { field, .. }) => assert_eq!(field, "mileage"),
            other => panic!("expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn alignment_is_deterministic() {
        let request = full_request();
        let first = format!("{:?}", align(&request).unwrap());
        let second = format!("{:?}", align(&request).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn named_rows_drop_undeclared_columns() {
        let mut row = HashMap::new();
        row.insert("brand".to_string(), FieldValue::from("Kia"));
        row.insert("price".to_string(), FieldValue::from(9999.0));
        row.insert("color".to_string(), FieldValue::from("red"));
        let vector = align_named(&row).unwrap();
        assert_eq!(vector.len(), schema::FEATURE_COLUMNS.len());
        assert_eq!(vector.text("brand"), Some("Kia"));
        assert_eq!(vector.text("model"), Some(CATEGORICAL_SENTINEL));
    }
}
