//! Serving-time scoring: one payload in, one label out, audit entry
//! appended. A label is returned even when the audit write fails.

use crate::error::ServiceError;
use crate::features::{extract, FeatureVector};
use crate::gate::{ClassificationGate, ClassificationResult};
use crate::model::Predictor;
use crate::storage::SessionLog;
use crate::telemetry::{
    parse_with_report, repair_object_separators, ParseReport, ParsedSession, RawSessionPayload,
    UNKNOWN_SESSION,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Persisted { entry_id: Uuid },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreOutcome {
    pub result: ClassificationResult,
    pub features: FeatureVector,
    pub report: ParseReport,
    pub audit: AuditStatus,
}

pub struct ScoringService {
    gate: ClassificationGate,
    predictor: Arc<dyn Predictor>,
    log: Arc<SessionLog>,
}

impl ScoringService {
    pub fn new(gate: ClassificationGate, predictor: Arc<dyn Predictor>, log: Arc<SessionLog>) -> Self {
        Self {
            gate,
            predictor,
            log,
        }
    }

    /// Score a request body. The whole document, unknown keys included, is
    /// audited, and the digest covers the body text as received. Bodies that
    /// are not a JSON object score as an empty session and are audited
    /// verbatim as a string.
    pub fn score_text(&self, body: &str) -> Result<ScoreOutcome, ServiceError> {
        let document = serde_json::from_str::<Value>(&repair_object_separators(body))
            .and_then(|value| RawSessionPayload::from_value(value.clone()).map(|raw| (raw, value)));
        match document {
            Ok((raw, details)) => {
                let (session, report) = parse_with_report(&raw);
                self.finish(&session, report, body, details)
            }
            Err(e) => {
                warn!(error = %e, "unreadable session payload");
                let session = ParsedSession::empty(UNKNOWN_SESSION);
                let report = ParseReport::unreadable(&e.to_string());
                self.finish(&session, report, body, Value::String(body.to_string()))
            }
        }
    }

    /// Score an already decoded payload; it is audited in its serialized form.
    pub fn score(&self, raw: &RawSessionPayload) -> Result<ScoreOutcome, ServiceError> {
        let (session, report) = parse_with_report(raw);
        let details = serde_json::to_value(raw).unwrap_or(Value::Null);
        let text = details.to_string();
        self.finish(&session, report, &text, details)
    }

    fn finish(
        &self,
        session: &ParsedSession,
        report: ParseReport,
        payload_text: &str,
        details: Value,
    ) -> Result<ScoreOutcome, ServiceError> {
        let features = extract(session);
        let result = self
            .gate
            .classify(&features, self.predictor.as_ref())
            .map_err(|e| {
                warn!(session_id = %features.session_id, error = %e, "classification failed");
                ServiceError::from(e)
            })?;

        let audit = match self.log.append(&result, payload_text, details) {
            Ok(entry) => AuditStatus::Persisted { entry_id: entry.id },
            Err(e) => {
                warn!(session_id = %result.session_id, error = %e, "session log write failed");
                AuditStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        info!(
            session_id = %result.session_id,
            prediction = %result.label,
            reason = ?result.reason,
            malformed_fields = report.failures(),
            "session classified"
        );
        Ok(ScoreOutcome {
            result,
            features,
            report,
            audit,
        })
    }
}
