use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use smartcore::linear::logistic_regression::LogisticRegression;

use backend::ml::artifacts::ModelBundle;
use backend::ml::features::{self, FeatureVector};
use backend::ml::loader;
use backend::ml::preprocess::Preprocessor;
use shared::FieldValue;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fits the price and price-tier models and writes the artifacts the API serves"
)]
struct Args {
    /// Path to the training CSV (feature columns plus a price column)
    #[arg(long, default_value = "data/cars.csv")]
    input: PathBuf,

    /// Directory to write the fitted artifacts into
    #[arg(long, default_value = "models")]
    output: PathBuf,

    /// Name of the price column in the CSV
    #[arg(long, default_value = "price")]
    price_column: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let (rows, prices) = read_training_data(&args.input, &args.price_column)?;
    info!(
        "Loaded {} training rows from {}",
        rows.len(),
        args.input.display()
    );
    if rows.len() < 2 {
        return Err(format!(
            "need at least 2 usable training rows, found {}",
            rows.len()
        )
        .into());
    }

    let preprocessor = Preprocessor::fit(&rows);
    info!("Fitted preprocessor: {}", preprocessor.describe());

    let encoded: Vec<Vec<f64>> = rows.iter().map(|row| preprocessor.transform(row)).collect();
    let matrix =
        DenseMatrix::from_2d_vec(&encoded).map_err(|e| format!("matrix error: {e}"))?;

    // The regression target is the natural log of the price; the tier
    // target is above/below the median log price, derived here the same
    // way the API inverts it at inference time.
    let log_prices: Vec<f64> = prices.iter().map(|price| price.ln()).collect();
    let median_log_price = median(&log_prices);
    let tiers: Vec<i64> = log_prices
        .iter()
        .map(|log_price| if *log_price > median_log_price { 1 } else { 0 })
        .collect();
    let high_count = tiers.iter().filter(|tier| **tier == 1).count();
    if high_count == 0 || high_count == tiers.len() {
        return Err("price column has no variance; cannot derive the tier target".into());
    }

    info!("Training regression model...");
    // One-hot blocks are collinear with the intercept; SVD tolerates the
    // rank deficiency where the QR path would not.
    let regressor = LinearRegression::fit(
        &matrix,
        &log_prices,
        LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD),
    )
    .map_err(|e| format!("regression training error: {e}"))?;

    info!("Training classification model...");
    let classifier = LogisticRegression::fit(&matrix, &tiers, Default::default())
        .map_err(|e| format!("classification training error: {e}"))?;

    let predicted_log = regressor
        .predict(&matrix)
        .map_err(|e| format!("predict error: {e}"))?;
    let rmse = rmse(&predicted_log, &log_prices);
    let predicted_tiers = classifier
        .predict(&matrix)
        .map_err(|e| format!("predict error: {e}"))?;
    let accuracy = predicted_tiers
        .iter()
        .zip(&tiers)
        .filter(|(predicted, actual)| predicted == actual)
        .count() as f64
        / tiers.len() as f64;
    info!("Regression - RMSE (log scale): {:.4}", rmse);
    info!("Classification - accuracy: {:.4}", accuracy);

    let bundle = ModelBundle {
        preprocessor,
        regressor,
        classifier,
    };
    loader::save_bundle(&args.output, &bundle)?;
    Ok(())
}

/// Reads the CSV into aligned feature rows plus the price target. Rows
/// whose price is missing or non-positive cannot feed the log target and
/// are skipped with a count reported at the end.
fn read_training_data(
    path: &PathBuf,
    price_column: &str,
) -> Result<(Vec<FeatureVector>, Vec<f64>), Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if !headers.iter().any(|header| header == price_column) {
        return Err(format!("price column '{}' not found in {}", price_column, path.display()).into());
    }

    let mut rows = Vec::new();
    let mut prices = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let named: HashMap<String, FieldValue> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, raw)| (header.clone(), FieldValue::Text(raw.to_string())))
            .collect();

        let price = match named.get(price_column) {
            Some(FieldValue::Text(raw)) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        match price {
            Some(price) if price > 0.0 => {
                rows.push(features::align_named(&named)?);
                prices.push(price);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        info!("Skipped {} rows without a usable price", skipped);
    }
    Ok((rows, prices))
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().max(1);
    (predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / n as f64)
        .sqrt()
}
