//! Persistent classification log.

mod session_log;

pub use session_log::{LogEntry, SessionLog, SessionSummary};
