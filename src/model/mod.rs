//! Classifier backends behind the [`Predictor`] seam.

mod logistic;
#[cfg(feature = "onnx")]
mod onnx;

pub use logistic::{LogisticModel, LogisticParams};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use crate::config::{ModelConfig, ModelKind};
use crate::error::ModelError;
use crate::features::FeatureInput;
use std::sync::Arc;

/// Externally trained classifier. Output is a class in `{0, 1}`; the gate
/// owns the mapping to labels. `predict` may block.
pub trait Predictor: Send + Sync {
    fn is_ready(&self) -> bool {
        true
    }

    fn predict(&self, input: &FeatureInput) -> Result<u8, ModelError>;
}

/// Placeholder for a backend that could not be brought up.
#[derive(Debug, Default)]
pub struct Unavailable;

impl Predictor for Unavailable {
    fn is_ready(&self) -> bool {
        false
    }

    fn predict(&self, _input: &FeatureInput) -> Result<u8, ModelError> {
        Err(ModelError::NotLoaded)
    }
}

/// Missing model files load in not-ready mode; malformed ones are errors.
pub fn load_predictor(config: &ModelConfig) -> Result<Arc<dyn Predictor>, ModelError> {
    match config.kind {
        ModelKind::Logistic => Ok(Arc::new(LogisticModel::load(&config.path)?)),
        #[cfg(feature = "onnx")]
        ModelKind::Onnx => Ok(Arc::new(OnnxClassifier::load(
            &config.path,
            config.score_threshold,
        )?)),
        #[cfg(not(feature = "onnx"))]
        ModelKind::Onnx => {
            tracing::warn!(path = %config.path.display(), "built without the onnx feature; inference disabled");
            Ok(Arc::new(Unavailable))
        }
    }
}
