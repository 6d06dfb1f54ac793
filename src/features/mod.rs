//! Behavioral feature extraction from parsed sessions.

mod extractor;
mod kinematics;

pub use extractor::{extract, FeatureExtractor};
pub use kinematics::{KinematicFeatures, KINEMATIC_COLUMNS};

use serde::{Deserialize, Serialize};

/// Model columns, in the order every classifier consumes them.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "total_events",
    "mouse_distance",
    "session_duration_ms",
    "avg_velocity",
    "click_count",
];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Ordered model input built from a [`FeatureVector`].
pub type FeatureInput = [f64; FEATURE_COUNT];

/// Fixed-schema summary of one session. The all-zero vector means "no
/// interaction observed" and is a valid value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub session_id: String,
    pub total_events: u64,
    /// Cumulative cursor path length in pixels
    pub mouse_distance: f64,
    /// Last timestamp minus first, as received
    pub session_duration_ms: i64,
    /// Pixels per second; 0 when the duration is not positive
    pub avg_velocity: f64,
    pub click_count: u64,
}

impl FeatureVector {
    pub fn zero(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            total_events: 0,
            mouse_distance: 0.0,
            session_duration_ms: 0,
            avg_velocity: 0.0,
            click_count: 0,
        }
    }

    /// No events, no cursor travel, no clicks.
    pub fn is_idle(&self) -> bool {
        self.total_events == 0 && self.mouse_distance == 0.0 && self.click_count == 0
    }

    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn model_input(&self) -> FeatureInput {
        [
            self.total_events as f64,
            self.mouse_distance,
            self.session_duration_ms as f64,
            self.avg_velocity,
            self.click_count as f64,
        ]
    }
}
