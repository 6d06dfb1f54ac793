//! Session → feature vector. Serving uses [`extract`]; corpus building uses
//! the stricter [`FeatureExtractor::extract_kinematics`].

use super::kinematics::KinematicFeatures;
use super::FeatureVector;
use crate::config::FeaturesConfig;
use crate::error::SessionTooSparse;
use crate::telemetry::{ParsedSession, Point};

pub(crate) fn distance(a: Point, b: Point) -> f64 {
    (b.x as f64 - a.x as f64).hypot(b.y as f64 - a.y as f64)
}

pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Deterministic and total: every session, including an empty one, yields
/// a vector.
pub fn extract(session: &ParsedSession) -> FeatureVector {
    let coords = session.coordinates();
    let times = session.timestamps();
    let actions = session.actions();

    let mouse_distance = if coords.len() > 1 {
        coords.windows(2).map(|w| distance(w[0], w[1])).sum()
    } else {
        0.0
    };

    // First/last as received, never sorted: out-of-order input can go negative.
    let session_duration_ms = match (times.first(), times.last()) {
        (Some(first), Some(last)) if times.len() > 1 => last.saturating_sub(*first),
        _ => 0,
    };

    let avg_velocity = if session_duration_ms > 0 {
        finite_or_zero(mouse_distance / (session_duration_ms as f64 / 1000.0))
    } else {
        0.0
    };

    FeatureVector {
        session_id: session.session_id().to_string(),
        total_events: actions.len() as u64,
        mouse_distance: finite_or_zero(mouse_distance),
        session_duration_ms,
        avg_velocity,
        click_count: actions.iter().filter(|a| a.is_click()).count() as u64,
    }
}

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, session: &ParsedSession) -> FeatureVector {
        extract(session)
    }

    /// Training-table variant: requires `min_aligned_samples` aligned
    /// coordinate/timestamp pairs and adds per-step kinematics.
    pub fn extract_kinematics(
        &self,
        session: &ParsedSession,
    ) -> Result<KinematicFeatures, SessionTooSparse> {
        let aligned = session.aligned_samples();
        if aligned < self.config.min_aligned_samples {
            return Err(SessionTooSparse {
                aligned,
                required: self.config.min_aligned_samples,
            });
        }
        Ok(KinematicFeatures::from_session(
            extract(session),
            session,
            self.config.zero_dt_epsilon(),
        ))
    }
}
