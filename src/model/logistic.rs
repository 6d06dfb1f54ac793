//! Logistic model described by a small JSON file:
//! `{"features": [...], "weights": [...], "bias": b, "threshold"?, "mean"?, "scale"?}`.
//! The feature list must match [`FEATURE_COLUMNS`] exactly, in order.

use crate::error::ModelError;
use crate::features::{FeatureInput, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::model::Predictor;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Probability at or above which the output is class 1
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Standardization applied before the weights, if the model was fit on
    /// scaled inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct Fitted {
    weights: FeatureInput,
    mean: FeatureInput,
    scale: FeatureInput,
    bias: f64,
    threshold: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    fitted: Option<Fitted>,
}

fn column_array(name: &str, values: &[f64]) -> Result<FeatureInput, ModelError> {
    values.try_into().map_err(|_| {
        ModelError::InvalidParameters(format!(
            "{} has {} entries, expected {}",
            name,
            values.len(),
            FEATURE_COUNT
        ))
    })
}

impl LogisticModel {
    /// Load from path. A missing file leaves the model not ready.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "model not found; inference disabled");
            return Ok(Self::unloaded());
        }
        let data = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let params: LogisticParams = serde_json::from_str(&data)?;
        let model = Self::from_params(params)?;
        tracing::info!(path = %path.display(), "logistic model loaded");
        Ok(model)
    }

    pub fn unloaded() -> Self {
        Self { fitted: None }
    }

    pub fn from_params(params: LogisticParams) -> Result<Self, ModelError> {
        if params.features.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(ModelError::SchemaMismatch {
                expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: params.features,
            });
        }
        let weights = column_array("weights", &params.weights)?;
        let mean = match &params.mean {
            Some(m) => column_array("mean", m)?,
            None => [0.0; FEATURE_COUNT],
        };
        let scale = match &params.scale {
            Some(s) => column_array("scale", s)?,
            None => [1.0; FEATURE_COUNT],
        };
        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelError::InvalidParameters(
                "scale entries must be finite and non-zero".into(),
            ));
        }
        let all_finite = weights.iter().chain(mean.iter()).all(|v| v.is_finite())
            && params.bias.is_finite()
            && params.threshold.is_finite();
        if !all_finite {
            return Err(ModelError::InvalidParameters("non-finite parameter".into()));
        }
        Ok(Self {
            fitted: Some(Fitted {
                weights,
                mean,
                scale,
                bias: params.bias,
                threshold: params.threshold,
            }),
        })
    }

    /// Class-1 probability, `None` when not loaded.
    pub fn probability(&self, input: &FeatureInput) -> Option<f64> {
        let f = self.fitted.as_ref()?;
        let z = f.bias
            + input
                .iter()
                .zip(f.weights.iter().zip(f.mean.iter().zip(f.scale.iter())))
                .map(|(x, (w, (m, s)))| w * (x - m) / s)
                .sum::<f64>();
        Some(1.0 / (1.0 + (-z).exp()))
    }
}

impl Predictor for LogisticModel {
    fn is_ready(&self) -> bool {
        self.fitted.is_some()
    }

    fn predict(&self, input: &FeatureInput) -> Result<u8, ModelError> {
        let (Some(f), Some(p)) = (self.fitted.as_ref(), self.probability(input)) else {
            return Err(ModelError::NotLoaded);
        };
        Ok(u8::from(p >= f.threshold))
    }
}
