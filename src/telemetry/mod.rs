//! Tolerant telemetry parsing: raw session payloads in any observed client
//! encoding → canonical [`ParsedSession`].

mod encoding;
mod grammar;
mod normalize;

pub use encoding::{ActionEncoding, CoordinateEncoding, TimestampEncoding};
pub use normalize::{repair_object_separators, BROKEN_SEPARATOR, REPAIRED_SEPARATOR};

use crate::error::MalformedSubfield;
use encoding::{parse_field, Actions, Coordinates, Timestamps};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Session id used when a payload carries none.
pub const UNKNOWN_SESSION: &str = "unknown_session";

/// Session payload as received. Each field keeps its raw JSON shape;
/// unknown keys are not parsed but are carried along for audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mousemove_total_behaviour: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mousemove_times: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_behaviour: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawSessionPayload {
    /// Reads a payload from document text, repairing broken object
    /// separators first. Fails only when the text is not a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let text = repair_object_separators(text);
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("session payload must be a JSON object"));
        }
        serde_json::from_value(value)
    }

    pub fn session_id(&self) -> String {
        match &self.session_id {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNKNOWN_SESSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionToken {
    Click(char),
    Move(Point),
}

impl ActionToken {
    pub fn is_click(&self) -> bool {
        matches!(self, ActionToken::Click(_))
    }
}

/// Canonical session. Sequences are independently well formed; their
/// lengths may differ and timestamps keep the order they arrived in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSession {
    session_id: String,
    coordinates: Vec<Point>,
    timestamps: Vec<i64>,
    actions: Vec<ActionToken>,
}

impl ParsedSession {
    pub fn new(
        session_id: impl Into<String>,
        coordinates: Vec<Point>,
        timestamps: Vec<i64>,
        actions: Vec<ActionToken>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            coordinates,
            timestamps,
            actions,
        }
    }

    pub fn empty(session_id: impl Into<String>) -> Self {
        Self::new(session_id, Vec::new(), Vec::new(), Vec::new())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn coordinates(&self) -> &[Point] {
        &self.coordinates
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn actions(&self) -> &[ActionToken] {
        &self.actions
    }

    /// Number of coordinate/timestamp pairs that line up by index.
    pub fn aligned_samples(&self) -> usize {
        self.coordinates.len().min(self.timestamps.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Coordinates,
    Timestamps,
    Actions,
}

impl Field {
    /// Payload key the field is read from.
    pub fn key(self) -> &'static str {
        match self {
            Field::Coordinates => "mousemove_total_behaviour",
            Field::Timestamps => "mousemove_times",
            Field::Actions => "total_behaviour",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Absent,
    Parsed,
    Malformed(MalformedSubfield),
}

/// Outcome of parsing one sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport<E> {
    pub status: FieldStatus,
    pub encoding: Option<E>,
    pub parsed: usize,
    /// Individual elements discarded while the field itself parsed.
    pub dropped: usize,
}

impl<E> FieldReport<E> {
    pub(crate) fn absent() -> Self {
        Self {
            status: FieldStatus::Absent,
            encoding: None,
            parsed: 0,
            dropped: 0,
        }
    }

    pub(crate) fn parsed(encoding: E, parsed: usize, dropped: usize) -> Self {
        Self {
            status: FieldStatus::Parsed,
            encoding: Some(encoding),
            parsed,
            dropped,
        }
    }

    pub(crate) fn malformed(field: Field, detail: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Malformed(MalformedSubfield {
                field,
                detail: detail.into(),
            }),
            encoding: None,
            parsed: 0,
            dropped: 0,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.status, FieldStatus::Malformed(_))
    }
}

/// Per-field diagnostics for one parse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub coordinates: FieldReport<CoordinateEncoding>,
    pub timestamps: FieldReport<TimestampEncoding>,
    pub actions: FieldReport<ActionEncoding>,
}

impl ParseReport {
    /// Report for a document that could not be read as a JSON object at all.
    pub fn unreadable(detail: &str) -> Self {
        Self {
            coordinates: FieldReport::malformed(Field::Coordinates, detail),
            timestamps: FieldReport::malformed(Field::Timestamps, detail),
            actions: FieldReport::malformed(Field::Actions, detail),
        }
    }

    /// Number of sub-fields that failed under every known encoding.
    pub fn failures(&self) -> usize {
        self.malformed().len()
    }

    pub fn malformed(&self) -> Vec<&MalformedSubfield> {
        [
            &self.coordinates.status,
            &self.timestamps.status,
            &self.actions.status,
        ]
        .into_iter()
        .filter_map(|s| match s {
            FieldStatus::Malformed(m) => Some(m),
            _ => None,
        })
        .collect()
    }

    pub fn dropped(&self) -> usize {
        self.coordinates.dropped + self.timestamps.dropped + self.actions.dropped
    }
}

/// Parses one payload. Never fails; see [`parse_with_report`] for the
/// per-field diagnostics.
pub fn parse(raw: &RawSessionPayload) -> ParsedSession {
    parse_with_report(raw).0
}

pub fn parse_with_report(raw: &RawSessionPayload) -> (ParsedSession, ParseReport) {
    let (coordinates, coordinates_report) =
        parse_field::<Coordinates>(raw.mousemove_total_behaviour.as_ref());
    let (timestamps, timestamps_report) = parse_field::<Timestamps>(raw.mousemove_times.as_ref());
    let (actions, actions_report) = parse_field::<Actions>(raw.total_behaviour.as_ref());

    let session = ParsedSession::new(raw.session_id(), coordinates, timestamps, actions);
    let report = ParseReport {
        coordinates: coordinates_report,
        timestamps: timestamps_report,
        actions: actions_report,
    };
    for m in report.malformed() {
        debug!(session_id = %session.session_id, field = %m.field, detail = %m.detail, "malformed sub-field");
    }
    (session, report)
}

/// Parses document text. A document that is not a JSON object yields an
/// empty session with every sub-field reported malformed.
pub fn parse_document(text: &str) -> (ParsedSession, ParseReport) {
    match RawSessionPayload::from_json_str(text) {
        Ok(raw) => parse_with_report(&raw),
        Err(e) => {
            debug!(error = %e, "unreadable session document");
            (
                ParsedSession::empty(UNKNOWN_SESSION),
                ParseReport::unreadable(&e.to_string()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> RawSessionPayload {
        RawSessionPayload::from_value(v).unwrap()
    }

    #[test]
    fn fields_fail_independently() {
        let raw = payload(json!({
            "session_id": "s1",
            "mousemove_total_behaviour": 42,
            "mousemove_times": "[1,2,3]",
            "total_behaviour": "c(l)m(1,1)",
        }));
        let (session, report) = parse_with_report(&raw);
        assert!(session.coordinates().is_empty());
        assert_eq!(session.timestamps(), &[1, 2, 3]);
        assert_eq!(session.actions().len(), 2);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.malformed()[0].field, Field::Coordinates);
    }

    #[test]
    fn numeric_session_id_and_missing_id() {
        assert_eq!(payload(json!({"session_id": 17})).session_id(), "17");
        assert_eq!(payload(json!({})).session_id(), UNKNOWN_SESSION);
    }

    #[test]
    fn unknown_keys_kept_but_not_parsed() {
        let body = json!({"session_id": "a", "userAgent": "x", "Mousemove_visited_urls": 3});
        let raw = payload(body.clone());
        assert_eq!(raw.session_id(), "a");
        assert!(raw.total_behaviour.is_none());
        assert_eq!(raw.extra["userAgent"], "x");
        assert_eq!(serde_json::to_value(&raw).unwrap(), body);
    }

    #[test]
    fn document_with_broken_separator_still_parses() {
        let text = r#"{"session_id":"s","extra":{"k":1}"mousemove_times":"1,2"}"#;
        let (session, report) = parse_document(text);
        assert_eq!(session.session_id(), "s");
        assert_eq!(session.timestamps(), &[1, 2]);
        assert_eq!(report.failures(), 0);
    }

    #[test]
    fn non_object_document_is_fully_malformed() {
        let (session, report) = parse_document("[1,2,3]");
        assert_eq!(session, ParsedSession::empty(UNKNOWN_SESSION));
        assert_eq!(report.failures(), 3);
    }

    #[test]
    fn aligned_samples_is_shorter_length() {
        let s = ParsedSession::new("s", vec![Point { x: 0, y: 0 }; 3], vec![0; 7], vec![]);
        assert_eq!(s.aligned_samples(), 3);
    }
}
