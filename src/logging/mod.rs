//! Structured logging setup and machine-readable result lines.

mod format;

pub use format::{ResultLine, StructuredLogger};
