//! Diagnostics go through tracing to stderr. Result lines (one JSON object
//! per scored session) go to stdout so they can be piped.

use crate::gate::{Label, Reason};
use crate::service::{AuditStatus, ScoreOutcome};
use crate::telemetry::Field;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
pub struct ResultLine<'a> {
    pub session_id: &'a str,
    pub prediction: Label,
    pub reason: Reason,
    pub audit: &'a AuditStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed_fields: Vec<Field>,
}

impl<'a> ResultLine<'a> {
    pub fn from_outcome(outcome: &'a ScoreOutcome) -> Self {
        Self {
            session_id: &outcome.result.session_id,
            prediction: outcome.result.label,
            reason: outcome.result.reason,
            audit: &outcome.audit,
            malformed_fields: outcome.report.malformed().iter().map(|m| m.field).collect(),
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber writing to stderr. `RUST_LOG` overrides
    /// `default_level`.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }

    /// Emit a single JSON line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        writeln!(w, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::gate::ClassificationResult;
    use crate::telemetry::ParseReport;

    #[test]
    fn result_line_is_one_json_object() {
        let outcome = ScoreOutcome {
            result: ClassificationResult {
                session_id: "s1".into(),
                label: Label::Bot,
                reason: Reason::ModelInference,
            },
            features: FeatureVector::zero("s1"),
            report: ParseReport::unreadable("eof"),
            audit: AuditStatus::Failed {
                error: "disk full".into(),
            },
        };
        let mut out = Vec::new();
        StructuredLogger::emit_json(&ResultLine::from_outcome(&outcome), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["prediction"], "Bot");
        assert_eq!(v["reason"], "model_inference");
        assert_eq!(v["audit"]["status"], "failed");
        assert_eq!(v["audit"]["error"], "disk full");
        assert_eq!(v["malformed_fields"][0], "coordinates");
        assert_eq!(v["malformed_fields"].as_array().unwrap().len(), 3);
    }
}
