use std::sync::{Arc, RwLock};

use log::debug;
use shared::{PredictionOutcome, PredictionRequest};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::ml::PredictionError;
use crate::ml::artifacts::{CLASSIFICATION_ALGORITHM, ModelBundle, REGRESSION_ALGORITHM};
use crate::ml::features;

/// Shared handle over the currently installed model bundle. Handlers take a
/// read snapshot per request; `install` swaps the whole bundle atomically,
/// so no inference call can observe a half-loaded state. An empty state is
/// the well-defined "unavailable" condition a failed load leaves behind.
#[derive(Clone, Default)]
pub struct ModelState {
    inner: Arc<RwLock<Option<Arc<ModelBundle>>>>,
}

impl ModelState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn install(&self, bundle: ModelBundle) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(Arc::new(bundle));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Immutable snapshot for one request, or `Unavailable` when no bundle
    /// is installed. A poisoned lock is treated as unavailable rather than
    /// propagated as a panic.
    pub fn service(&self) -> Result<PredictionService, PredictionError> {
        let slot = self.inner.read().map_err(|_| PredictionError::Unavailable)?;
        match slot.as_ref() {
            Some(bundle) => Ok(PredictionService {
                bundle: Arc::clone(bundle),
            }),
            None => Err(PredictionError::Unavailable),
        }
    }
}

/// Stateless request/response transform over an immutable artifact handle.
pub struct PredictionService {
    bundle: Arc<ModelBundle>,
}

impl PredictionService {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    /// Runs the full pipeline: align the request into the trained feature
    /// order, replay the fitted preprocessing, predict, and shape the
    /// result. The regression target is the natural log of the price, so
    /// the raw prediction is exponentiated before the 2-decimal boundary
    /// rounding.
    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionOutcome, PredictionError> {
        let vector = features::align(request)?;
        let row = self.bundle.preprocessor.transform(&vector);
        debug!("Encoded feature row of width {}", row.len());

        let matrix = DenseMatrix::from_2d_vec(&vec![row]).map_err(|e| {
            PredictionError::Inference(format!("feature matrix construction failed: {e}"))
        })?;

        let log_price = self
            .bundle
            .regressor
            .predict(&matrix)
            .map_err(|e| PredictionError::Inference(format!("regression predict failed: {e}")))?
            .first()
            .copied()
            .ok_or_else(|| {
                PredictionError::Inference("regression returned no prediction".to_string())
            })?;

        let label = self
            .bundle
            .classifier
            .predict(&matrix)
            .map_err(|e| PredictionError::Inference(format!("classification predict failed: {e}")))?
            .first()
            .copied()
            .ok_or_else(|| {
                PredictionError::Inference("classification returned no prediction".to_string())
            })?;

        // The fitted classifier exposes no probability output, so the
        // contract is filled with the degenerate probability of the hard
        // label. Still always populated and always within [0, 1].
        let (price_tier, high_price_probability) = if label == 1 {
            ("high".to_string(), 1.0)
        } else {
            ("low".to_string(), 0.0)
        };

        Ok(PredictionOutcome {
            predicted_price: round_price(log_price.exp()),
            price_tier,
            high_price_probability,
            regression_model: REGRESSION_ALGORITHM.to_string(),
            classification_model: CLASSIFICATION_ALGORITHM.to_string(),
        })
    }

    pub fn preprocessor_summary(&self) -> String {
        self.bundle.preprocessor.describe()
    }
}

fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
