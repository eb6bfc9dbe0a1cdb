use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::ml::artifacts::{
    CLASSIFIER_FILE, ModelBundle, PREPROCESSOR_FILE, PriceRegressor, REGRESSOR_FILE,
    TierClassifier,
};
use crate::ml::preprocess::Preprocessor;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found at {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read model artifact {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize model artifact {}: {}", .path.display(), .source)]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// Reads the three named artifact slots from `dir` into a fresh bundle.
/// Nothing is cached on failure, so a caller that keeps its previous state
/// on error never observes a half-loaded bundle. The fitted preprocessor is
/// checked against the declared feature schema before the predictors are
/// even opened.
pub fn load_bundle(dir: &Path) -> Result<ModelBundle, LoadError> {
    let preprocessor: Preprocessor = load_slot(&dir.join(PREPROCESSOR_FILE))?;
    preprocessor.check_schema().map_err(LoadError::SchemaMismatch)?;
    let regressor: PriceRegressor = load_slot(&dir.join(REGRESSOR_FILE))?;
    let classifier: TierClassifier = load_slot(&dir.join(CLASSIFIER_FILE))?;
    info!("Loaded model artifacts from {}", dir.display());
    Ok(ModelBundle {
        preprocessor,
        regressor,
        classifier,
    })
}

/// Writes a fitted bundle into the named slots the loader reads.
pub fn save_bundle(dir: &Path, bundle: &ModelBundle) -> Result<(), LoadError> {
    fs::create_dir_all(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    save_slot(&dir.join(PREPROCESSOR_FILE), &bundle.preprocessor)?;
    save_slot(&dir.join(REGRESSOR_FILE), &bundle.regressor)?;
    save_slot(&dir.join(CLASSIFIER_FILE), &bundle.classifier)?;
    info!("Saved model artifacts to {}", dir.display());
    Ok(())
}

fn load_slot<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}

fn save_slot<T: Serialize>(path: &Path, value: &T) -> Result<(), LoadError> {
    let file = File::create(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(|source| LoadError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("price-api-loader-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_directory_reports_not_found_with_the_path() {
        let dir = scratch_dir("absent");
        match load_bundle(&dir) {
            Err(LoadError::NotFound { path }) => {
                assert!(path.ends_with(PREPROCESSOR_FILE));
            }
            other => panic!("expected NotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn corrupt_artifact_reports_deserialize_with_the_path() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PREPROCESSOR_FILE), b"not json at all").unwrap();
        match load_bundle(&dir) {
            Err(LoadError::Deserialize { path, .. }) => {
                assert!(path.ends_with(PREPROCESSOR_FILE));
            }
            other => panic!("expected Deserialize, got {:?}", other.err()),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn saved_artifacts_load_back_into_a_working_service() {
        let dir = scratch_dir("roundtrip");
        let bundle = crate::ml::service::tests::fitted_bundle();
        save_bundle(&dir, &bundle).unwrap();

        let loaded = load_bundle(&dir).unwrap();
        assert_eq!(
            loaded.preprocessor.output_width(),
            bundle.preprocessor.output_width()
        );
        let service = crate::ml::service::PredictionService::new(loaded);
        let outcome = service
            .predict(&shared::PredictionRequest::default())
            .unwrap();
        assert!(outcome.predicted_price.is_finite());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn stale_schema_fails_fast_before_the_predictors_load() {
        let dir = scratch_dir("schema");
        fs::create_dir_all(&dir).unwrap();
        let stale = serde_json::json!({
            "numeric": [{"name": "anos", "median": 0.0, "mean": 0.0, "std_dev": 1.0}],
            "categorical": []
        });
        fs::write(
            dir.join(PREPROCESSOR_FILE),
            serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            load_bundle(&dir),
            Err(LoadError::SchemaMismatch(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
