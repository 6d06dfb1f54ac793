//! Two-state decision per session: idle override or model inference.

use crate::error::{GateError, ModelError};
use crate::features::FeatureVector;
use crate::model::Predictor;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Human,
    Bot,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Human => "Human",
            Label::Bot => "Bot",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// No interaction captured; classifier skipped
    IdleOverride,
    ModelInference,
}

/// Fixed mapping between classifier classes and labels. A configuration
/// constant; never inferred from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMapping {
    /// `{0: Bot, 1: Human}`
    #[default]
    ZeroIsBot,
    /// `{0: Human, 1: Bot}`
    ZeroIsHuman,
}

impl LabelMapping {
    pub fn label(self, class: u8) -> Option<Label> {
        match (self, class) {
            (LabelMapping::ZeroIsBot, 0) | (LabelMapping::ZeroIsHuman, 1) => Some(Label::Bot),
            (LabelMapping::ZeroIsBot, 1) | (LabelMapping::ZeroIsHuman, 0) => Some(Label::Human),
            _ => None,
        }
    }

    pub fn class(self, label: Label) -> u8 {
        match (self, label) {
            (LabelMapping::ZeroIsBot, Label::Bot) | (LabelMapping::ZeroIsHuman, Label::Human) => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub session_id: String,
    pub label: Label,
    pub reason: Reason,
}

/// Stateless per call; holds only the label mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationGate {
    mapping: LabelMapping,
}

impl ClassificationGate {
    pub fn new(mapping: LabelMapping) -> Self {
        Self { mapping }
    }

    /// Idle sessions are `Human` without touching the predictor. Anything
    /// else needs a ready predictor; there is no default label.
    pub fn classify(
        &self,
        features: &FeatureVector,
        predictor: &dyn Predictor,
    ) -> Result<ClassificationResult, GateError> {
        if features.is_idle() {
            debug!(session_id = %features.session_id, "idle override");
            return Ok(ClassificationResult {
                session_id: features.session_id.clone(),
                label: Label::Human,
                reason: Reason::IdleOverride,
            });
        }

        if !predictor.is_ready() {
            return Err(GateError::ClassifierUnavailable);
        }
        let class = match predictor.predict(&features.model_input()) {
            Ok(c) => c,
            Err(ModelError::NotLoaded) => return Err(GateError::ClassifierUnavailable),
            Err(e) => return Err(e.into()),
        };
        let label = self
            .mapping
            .label(class)
            .ok_or(ModelError::UnexpectedOutput(i64::from(class)))?;
        debug!(session_id = %features.session_id, class, %label, "model inference");
        Ok(ClassificationResult {
            session_id: features.session_id.clone(),
            label,
            reason: Reason::ModelInference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureInput;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        class: u8,
        ready: bool,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(class: u8, ready: bool) -> Self {
            Self {
                class,
                ready,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Predictor for Fixed {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn predict(&self, _input: &FeatureInput) -> Result<u8, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.class)
        }
    }

    fn active() -> FeatureVector {
        FeatureVector {
            total_events: 3,
            mouse_distance: 12.0,
            click_count: 1,
            ..FeatureVector::zero("s")
        }
    }

    #[test]
    fn idle_override_skips_predictor() {
        let p = Fixed::new(0, true);
        let r = ClassificationGate::default()
            .classify(&FeatureVector::zero("s"), &p)
            .unwrap();
        assert_eq!(r.label, Label::Human);
        assert_eq!(r.reason, Reason::IdleOverride);
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn idle_override_ignores_duration_and_velocity() {
        let p = Fixed::new(0, true);
        let gate = ClassificationGate::default();
        for fv in [
            FeatureVector {
                session_duration_ms: 1000,
                avg_velocity: 3.0,
                ..FeatureVector::zero("s")
            },
            FeatureVector {
                session_duration_ms: -250,
                ..FeatureVector::zero("s")
            },
        ] {
            let r = gate.classify(&fv, &p).unwrap();
            assert_eq!(r.label, Label::Human);
            assert_eq!(r.reason, Reason::IdleOverride);
        }
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn idle_override_needs_all_three_zero() {
        let p = Fixed::new(0, true);
        let gate = ClassificationGate::default();
        for fv in [
            FeatureVector { total_events: 1, ..FeatureVector::zero("s") },
            FeatureVector { mouse_distance: 0.5, ..FeatureVector::zero("s") },
            FeatureVector { click_count: 1, ..FeatureVector::zero("s") },
        ] {
            assert_eq!(gate.classify(&fv, &p).unwrap().reason, Reason::ModelInference);
        }
    }

    #[test]
    fn mapping_applied() {
        let p = Fixed::new(0, true);
        let bot = ClassificationGate::new(LabelMapping::ZeroIsBot).classify(&active(), &p).unwrap();
        let human = ClassificationGate::new(LabelMapping::ZeroIsHuman).classify(&active(), &p).unwrap();
        assert_eq!(bot.label, Label::Bot);
        assert_eq!(human.label, Label::Human);
        assert_eq!(bot.reason, Reason::ModelInference);
    }

    #[test]
    fn unavailable_predictor_is_an_error() {
        let p = Fixed::new(1, false);
        let err = ClassificationGate::default().classify(&active(), &p).unwrap_err();
        assert!(matches!(err, GateError::ClassifierUnavailable));
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unavailable_predictor_still_answers_idle() {
        let p = Fixed::new(1, false);
        let r = ClassificationGate::default().classify(&FeatureVector::zero("s"), &p).unwrap();
        assert_eq!(r.reason, Reason::IdleOverride);
    }

    #[test]
    fn out_of_range_class_rejected() {
        let p = Fixed::new(2, true);
        let err = ClassificationGate::default().classify(&active(), &p).unwrap_err();
        assert!(matches!(err, GateError::Model(ModelError::UnexpectedOutput(2))));
    }

    #[test]
    fn mapping_round_trips_labels() {
        for m in [LabelMapping::ZeroIsBot, LabelMapping::ZeroIsHuman] {
            for l in [Label::Human, Label::Bot] {
                assert_eq!(m.label(m.class(l)), Some(l));
            }
        }
    }
}
