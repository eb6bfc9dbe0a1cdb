use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::LinearRegression;
use smartcore::linear::logistic_regression::LogisticRegression;

use crate::ml::preprocess::Preprocessor;

/// Price model, fit against the natural log of the price.
pub type PriceRegressor = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Price-tier model over the binary above-median-log-price target.
pub type TierClassifier = LogisticRegression<f64, i64, DenseMatrix<f64>, Vec<i64>>;

pub const REGRESSION_ALGORITHM: &str = "LinearRegression";
pub const CLASSIFICATION_ALGORITHM: &str = "LogisticRegression";

/// Named artifact slots inside the model directory.
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const REGRESSOR_FILE: &str = "regressor.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// The full set of fitted objects a prediction needs. Loaded once, shared
/// read-only across all inference calls, never mutated after load.
pub struct ModelBundle {
    pub preprocessor: Preprocessor,
    pub regressor: PriceRegressor,
    pub classifier: TierClassifier,
}
