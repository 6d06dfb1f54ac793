//! Classification gate: idle-session override, otherwise model inference.

mod engine;

pub use engine::{ClassificationGate, ClassificationResult, Label, LabelMapping, Reason};
