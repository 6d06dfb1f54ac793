//! Per-step velocity and acceleration statistics over aligned samples.

use super::extractor::{distance, finite_or_zero};
use super::FeatureVector;
use crate::telemetry::ParsedSession;
use serde::{Deserialize, Serialize};

/// Extra export columns, after the base feature columns.
pub const KINEMATIC_COLUMNS: [&str; 4] = [
    "mean_step_velocity",
    "std_step_velocity",
    "max_step_velocity",
    "avg_abs_acceleration",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicFeatures {
    /// Same vector the serving path computes for this session
    pub base: FeatureVector,
    pub aligned_samples: usize,
    /// Pixels per millisecond
    pub mean_step_velocity: f64,
    /// Sample standard deviation (n - 1)
    pub std_step_velocity: f64,
    pub max_step_velocity: f64,
    pub avg_abs_acceleration: f64,
}

impl KinematicFeatures {
    /// Steps run over the first `aligned_samples` coordinate/timestamp pairs.
    /// The first step has zero distance and zero acceleration; zero time
    /// deltas are replaced by `zero_dt`.
    pub(crate) fn from_session(base: FeatureVector, session: &ParsedSession, zero_dt: f64) -> Self {
        let n = session.aligned_samples();
        let coords = &session.coordinates()[..n];
        let times = &session.timestamps()[..n];

        let mut velocities = Vec::with_capacity(n);
        let mut abs_accel_sum = 0.0;
        let mut prev_v = 0.0;
        for i in 0..n {
            let (d, dt) = if i == 0 {
                (0.0, 0.0)
            } else {
                (
                    distance(coords[i - 1], coords[i]),
                    times[i] as f64 - times[i - 1] as f64,
                )
            };
            let dt = if dt == 0.0 { zero_dt } else { dt };
            let v = finite_or_zero(d / dt);
            if i > 0 {
                abs_accel_sum += finite_or_zero((v - prev_v) / dt).abs();
            }
            velocities.push(v);
            prev_v = v;
        }

        let (mean, std) = mean_std(&velocities);
        let max = velocities.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.max(v)))
        });
        let avg_abs_acceleration = if n == 0 { 0.0 } else { abs_accel_sum / n as f64 };

        Self {
            base,
            aligned_samples: n,
            mean_step_velocity: finite_or_zero(mean),
            std_step_velocity: finite_or_zero(std),
            max_step_velocity: max.unwrap_or(0.0),
            avg_abs_acceleration: finite_or_zero(avg_abs_acceleration),
        }
    }

    /// Values in [`KINEMATIC_COLUMNS`] order.
    pub fn extra_columns(&self) -> [f64; 4] {
        [
            self.mean_step_velocity,
            self.std_step_velocity,
            self.max_step_velocity,
            self.avg_abs_acceleration,
        ]
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;
    use crate::telemetry::Point;

    fn session(coords: &[(i64, i64)], times: &[i64]) -> ParsedSession {
        ParsedSession::new(
            "k",
            coords.iter().map(|&(x, y)| Point { x, y }).collect(),
            times.to_vec(),
            vec![],
        )
    }

    fn kin(s: &ParsedSession) -> KinematicFeatures {
        KinematicFeatures::from_session(extract(s), s, 0.001)
    }

    #[test]
    fn constant_speed() {
        // 5 px every 10 ms
        let s = session(
            &[(0, 0), (3, 4), (6, 8), (9, 12), (12, 16)],
            &[0, 10, 20, 30, 40],
        );
        let k = kin(&s);
        assert_eq!(k.aligned_samples, 5);
        assert_eq!(k.max_step_velocity, 0.5);
        // velocities [0, .5, .5, .5, .5]
        assert!((k.mean_step_velocity - 0.4).abs() < 1e-12);
        assert!((k.std_step_velocity - 0.223_606_797_749_979).abs() < 1e-12);
        // only the 0 -> .5 jump accelerates: .5 / 10 over 5 samples
        assert!((k.avg_abs_acceleration - 0.01).abs() < 1e-12);
    }

    #[test]
    fn zero_time_delta_stays_finite() {
        let s = session(&[(0, 0), (100, 0), (200, 0), (300, 0), (400, 0)], &[5, 5, 5, 5, 5]);
        let k = kin(&s);
        assert!(k.mean_step_velocity.is_finite());
        assert!(k.std_step_velocity.is_finite());
        assert!(k.max_step_velocity.is_finite());
        assert!(k.avg_abs_acceleration.is_finite());
        assert_eq!(k.max_step_velocity, 100.0 / 0.001);
    }

    #[test]
    fn truncates_to_aligned_length() {
        let s = session(&[(0, 0), (1, 0), (2, 0)], &[0, 1, 2, 3, 4, 5]);
        assert_eq!(kin(&s).aligned_samples, 3);
    }

    #[test]
    fn base_matches_serving_extract() {
        let s = session(&[(0, 0), (3, 4), (0, 0), (3, 4), (0, 0)], &[0, 100, 200, 300, 400]);
        assert_eq!(kin(&s).base, extract(&s));
    }
}
