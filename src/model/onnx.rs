//! ONNX Runtime classifier. Input: [1, FEATURE_COUNT] f32 in column order.
//! Output 0 is read as an int64 class label, or as an f32 class-1 score.
//! If the model file is missing, runs in not-ready mode.

use crate::error::ModelError;
use crate::features::{FeatureInput, FEATURE_COUNT};
use crate::model::Predictor;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::OnceLock;

static ORT_INIT: OnceLock<()> = OnceLock::new();

fn init_env() {
    ORT_INIT.get_or_init(|| {
        if let Err(e) = ort::init().with_name("clickguard").commit() {
            tracing::warn!(error = %e, "ONNX runtime environment init failed");
        }
    });
}

pub struct OnnxClassifier {
    session: Option<Session>,
    input_name: String,
    score_threshold: f32,
}

impl OnnxClassifier {
    pub fn load(path: &Path, score_threshold: f32) -> Result<Self, ModelError> {
        init_env();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "ONNX model not found; inference disabled");
            return Ok(Self {
                session: None,
                input_name: String::new(),
                score_threshold,
            });
        }

        let session = Session::builder()?.commit_from_file(path)?;
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());
        tracing::info!(path = %path.display(), input = %input_name, "ONNX model loaded");

        Ok(Self {
            session: Some(session),
            input_name,
            score_threshold,
        })
    }
}

impl Predictor for OnnxClassifier {
    fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    fn predict(&self, input: &FeatureInput) -> Result<u8, ModelError> {
        let Some(ref session) = self.session else {
            return Err(ModelError::NotLoaded);
        };

        let values: Vec<f32> = input.iter().map(|v| *v as f32).collect();
        let arr = Array2::from_shape_vec((1, FEATURE_COUNT), values)
            .map_err(|e| ModelError::InvalidParameters(e.to_string()))?;
        let tensor = Tensor::from_array(arr)?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor]?)?;
        let out = &outputs[0];

        if let Ok(labels) = out.try_extract_tensor::<i64>() {
            return class_from_labels(labels.iter().copied());
        }
        let scores = out.try_extract_tensor::<f32>()?;
        class_from_scores(scores.iter().copied(), self.score_threshold)
    }
}

fn class_from_labels(mut labels: impl Iterator<Item = i64>) -> Result<u8, ModelError> {
    match labels.next() {
        Some(c @ (0 | 1)) => Ok(c as u8),
        Some(c) => Err(ModelError::UnexpectedOutput(c)),
        None => Err(ModelError::InvalidParameters("empty label tensor".into())),
    }
}

/// Last score is the class-1 score (`[p]` or `[p0, p1]`).
fn class_from_scores(scores: impl Iterator<Item = f32>, threshold: f32) -> Result<u8, ModelError> {
    let Some(score) = scores.last() else {
        return Err(ModelError::InvalidParameters("empty score tensor".into()));
    };
    Ok(u8::from(score >= threshold))
}
