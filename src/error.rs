//! Error taxonomy shared across the pipeline.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::telemetry::Field;

/// One telemetry sub-field could not be read under any known encoding.
/// Recovered locally: the field resolves to an empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("malformed {field}: {detail}")]
pub struct MalformedSubfield {
    pub field: Field,
    pub detail: String,
}

/// Too few aligned coordinate/timestamp samples for the training table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session too sparse: {aligned} aligned samples, {required} required")]
pub struct SessionTooSparse {
    pub aligned: usize,
    pub required: usize,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model expects features {found:?}, pipeline produces {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("model parameters: {0}")]
    InvalidParameters(String),
    #[error("model not loaded")]
    NotLoaded,
    #[error("classifier returned {0}, expected 0 or 1")]
    UnexpectedOutput(i64),
    #[cfg(feature = "onnx")]
    #[error("onnx runtime: {0}")]
    Onnx(#[from] ort::Error),
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("classifier unavailable")]
    ClassifierUnavailable,
    #[error("classifier failed: {0}")]
    Model(#[from] ModelError),
}

/// The session log could not be read or rewritten.
#[derive(Debug, Error)]
pub enum LogPersistenceError {
    #[error("session log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session log {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("session log {} does not hold a JSON array", .0.display())]
    NotAnArray(PathBuf),
    #[error("session log lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize repaired corpus: {0}")]
    Json(#[from] serde_json::Error),
    #[error("walk {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that leave the serving boundary without a label.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("classifier unavailable")]
    ClassifierUnavailable,
    #[error("inference failed: {0}")]
    Inference(ModelError),
}

impl From<GateError> for ServiceError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::ClassifierUnavailable => ServiceError::ClassifierUnavailable,
            GateError::Model(m) => ServiceError::Inference(m),
        }
    }
}
