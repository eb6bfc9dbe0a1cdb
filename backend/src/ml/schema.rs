use shared::{FieldValue, PredictionRequest};

/// Placeholder for a numeric feature the caller did not supply. The
/// preprocessor was fit with median imputation, so NaN cells are replaced
/// with the training median before scaling.
pub const NUMERIC_SENTINEL: f64 = f64::NAN;

/// Placeholder category for an absent or empty categorical feature. Must
/// stay in sync with the constant fill value the preprocessor was fit with.
pub const CATEGORICAL_SENTINEL: &str = "missing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureColumn {
    pub name: &'static str,
    pub kind: FeatureKind,
}

/// Ordered list of feature columns the fitted pipeline was trained against.
/// This order MUST match exactly the column order used when fitting the
/// artifacts; any change here is a breaking change for persisted models.
pub const FEATURE_COLUMNS: &[FeatureColumn] = &[
    FeatureColumn { name: "brand", kind: FeatureKind::Categorical },
    FeatureColumn { name: "model", kind: FeatureKind::Categorical },
    FeatureColumn { name: "year", kind: FeatureKind::Numeric },
    FeatureColumn { name: "transmission", kind: FeatureKind::Categorical },
    FeatureColumn { name: "mileage_km", kind: FeatureKind::Numeric },
    FeatureColumn { name: "fuel", kind: FeatureKind::Categorical },
    FeatureColumn { name: "engine_capacity_cc", kind: FeatureKind::Numeric },
    FeatureColumn { name: "horsepower_hp", kind: FeatureKind::Numeric },
    FeatureColumn { name: "seats", kind: FeatureKind::Numeric },
    FeatureColumn { name: "top_speed_kmh", kind: FeatureKind::Numeric },
];

/// Declared mapping from public request fields to internal feature names.
/// Features without a binding (`horsepower_hp`, `seats`, `top_speed_kmh`)
/// are not exposed on the request schema and always take the sentinel.
/// Returns the public field name alongside the value so validation errors
/// can name the field the caller actually sent.
pub fn supplied<'a>(
    request: &'a PredictionRequest,
    feature: &str,
) -> Option<(&'static str, &'a FieldValue)> {
    match feature {
        "brand" => Some(("manufacturer", &request.manufacturer)),
        "model" => Some(("model", &request.model)),
        "year" => Some(("year", &request.year)),
        "transmission" => Some(("transmission", &request.transmission)),
        "mileage_km" => Some(("mileage", &request.mileage)),
        "fuel" => Some(("fuelType", &request.fuel_type)),
        "engine_capacity_cc" => Some(("engineSize", &request.engine_size)),
        _ => None,
    }
}

/// Position of a feature in the declared column order.
pub fn position(feature: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|column| column.name == feature)
}

pub fn numeric_names() -> Vec<&'static str> {
    FEATURE_COLUMNS
        .iter()
        .filter(|column| column.kind == FeatureKind::Numeric)
        .map(|column| column.name)
        .collect()
}

pub fn categorical_names() -> Vec<&'static str> {
    FEATURE_COLUMNS
        .iter()
        .filter(|column| column.kind == FeatureKind::Categorical)
        .map(|column| column.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_binding_targets_a_declared_column() {
        let request = PredictionRequest::default();
        let bound: Vec<&str> = FEATURE_COLUMNS
            .iter()
            .filter(|column| supplied(&request, column.name).is_some())
            .map(|column| column.name)
            .collect();
        assert_eq!(
            bound,
            vec!["brand", "model", "year", "transmission", "mileage_km", "fuel", "engine_capacity_cc"]
        );
    }

    #[test]
    fn column_order_is_stable() {
        assert_eq!(FEATURE_COLUMNS.len(), 10);
        assert_eq!(FEATURE_COLUMNS[0].name, "brand");
        assert_eq!(position("engine_capacity_cc"), Some(6));
        assert_eq!(position("nonexistent"), None);
    }
}
