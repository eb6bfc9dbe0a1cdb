use serde::{Deserialize, Serialize};

use crate::ml::features::FeatureVector;
use crate::ml::schema::{self, CATEGORICAL_SENTINEL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// The fitted preprocessing transform, persisted at training time and
/// replayed unchanged at inference time. Numeric columns are median-imputed
/// then standard-scaled; categorical columns are constant-filled then
/// one-hot encoded over the categories seen in training, with unknown
/// categories encoding to all zeros. The output row lays out all numeric
/// columns first, then the one-hot blocks, matching the fit-time layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let numeric = schema::numeric_names()
            .into_iter()
            .map(|name| {
                let observed: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| row.number(name))
                    .filter(|value| value.is_finite())
                    .collect();
                let median = median(&observed);
                let imputed: Vec<f64> = rows
                    .iter()
                    .map(|row| match row.number(name) {
                        Some(value) if value.is_finite() => value,
                        _ => median,
                    })
                    .collect();
                let mean = mean(&imputed);
                let std_dev = std_dev(&imputed, mean);
                NumericColumn {
                    name: name.to_string(),
                    median,
                    mean,
                    std_dev,
                }
            })
            .collect();

        let categorical = schema::categorical_names()
            .into_iter()
            .map(|name| {
                let mut categories: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        row.text(name)
                            .unwrap_or(CATEGORICAL_SENTINEL)
                            .to_string()
                    })
                    .collect();
                categories.sort();
                categories.dedup();
                CategoricalColumn {
                    name: name.to_string(),
                    categories,
                }
            })
            .collect();

        Preprocessor {
            numeric,
            categorical,
        }
    }

    /// Encodes a feature row into the numeric input the models were fit on.
    /// Never fails: imputation absorbs NaN cells and unknown categories
    /// encode to zeros.
    pub fn transform(&self, row: &FeatureVector) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.output_width());
        for column in &self.numeric {
            let raw = match row.number(&column.name) {
                Some(value) if value.is_finite() => value,
                _ => column.median,
            };
            let scale = if column.std_dev > f64::EPSILON {
                column.std_dev
            } else {
                1.0
            };
            encoded.push((raw - column.mean) / scale);
        }
        for column in &self.categorical {
            let value = row.text(&column.name).unwrap_or(CATEGORICAL_SENTINEL);
            for category in &column.categories {
                encoded.push(if category == value { 1.0 } else { 0.0 });
            }
        }
        encoded
    }

    pub fn output_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|column| column.categories.len())
                .sum::<usize>()
    }

    /// Verifies the fitted column lists against the declared feature schema.
    /// Run at load time so a stale artifact fails fast instead of silently
    /// mis-predicting.
    pub fn check_schema(&self) -> Result<(), String> {
        let fitted_numeric: Vec<&str> = self.numeric.iter().map(|c| c.name.as_str()).collect();
        if fitted_numeric != schema::numeric_names() {
            return Err(format!(
                "numeric columns {:?} do not match declared schema {:?}",
                fitted_numeric,
                schema::numeric_names()
            ));
        }
        let fitted_categorical: Vec<&str> =
            self.categorical.iter().map(|c| c.name.as_str()).collect();
        if fitted_categorical != schema::categorical_names() {
            return Err(format!(
                "categorical columns {:?} do not match declared schema {:?}",
                fitted_categorical,
                schema::categorical_names()
            ));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!(
            "median impute + standard scale ({} numeric), constant fill + one-hot ({} categorical, {} encoded)",
            self.numeric.len(),
            self.categorical.len(),
            self.output_width() - self.numeric.len()
        )
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
