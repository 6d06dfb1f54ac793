//! clickguard: human-vs-bot classification of recorded web sessions.
//!
//! Modular structure:
//! - [`telemetry`]: Tolerant parsing of raw mouse/click telemetry
//! - [`features`]: Session summary features and kinematic extras
//! - [`gate`]: Idle override + classifier decision
//! - [`model`]: Logistic and (optional) ONNX classifiers
//! - [`storage`]: Append-only session log
//! - [`service`]: Serving-time scoring with audit
//! - [`corpus`]: Offline training table builder, CSV export, repair
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod gate;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use config::AppConfig;
pub use features::{extract, FeatureExtractor, FeatureVector};
pub use gate::{ClassificationGate, ClassificationResult, Label, Reason};
pub use logging::StructuredLogger;
pub use model::{load_predictor, LogisticModel, Predictor};
pub use service::{ScoreOutcome, ScoringService};
pub use storage::SessionLog;
pub use telemetry::{parse, ParsedSession, RawSessionPayload};
