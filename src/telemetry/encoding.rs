//! Encoding variants per telemetry sub-field and the single dispatch step
//! that turns any of them into a canonical sequence.

use serde::Serialize;
use serde_json::Value;

use super::grammar::{self, Scan};
use super::normalize::{braces_to_brackets, looks_bracketed, repair_object_separators, strip_delimiters};
use super::{ActionToken, Field, FieldReport, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateEncoding {
    /// `m(x,y)m(x,y)...`
    TokenGrammar,
    /// `[[x,y],[x,y]]`, possibly brace-delimited
    BracketPairs,
    /// JSON list of `{x,y}` records or `[x,y]` tuples
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampEncoding {
    /// Comma-separated integers with stray brackets
    Delimited,
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEncoding {
    /// Concatenated `c(k)` / `m(x,y)` tokens
    TokenStream,
    Structured,
}

/// How one sub-field reads its string form and its structured elements.
pub(crate) trait SubfieldGrammar {
    type Item;
    type Encoding: Copy;

    const FIELD: Field;
    const STRUCTURED: Self::Encoding;

    /// `None` when the text holds nothing recognisable under any encoding.
    fn parse_text(text: &str) -> Option<(Self::Encoding, Scan<Self::Item>)>;

    /// Appends the values carried by one structured element; false drops it.
    fn parse_element(value: &Value, out: &mut Vec<Self::Item>) -> bool;
}

pub(crate) struct Coordinates;
pub(crate) struct Timestamps;
pub(crate) struct Actions;

impl SubfieldGrammar for Coordinates {
    type Item = Point;
    type Encoding = CoordinateEncoding;

    const FIELD: Field = Field::Coordinates;
    const STRUCTURED: CoordinateEncoding = CoordinateEncoding::Structured;

    fn parse_text(text: &str) -> Option<(CoordinateEncoding, Scan<Point>)> {
        let tokens = grammar::move_tokens(text);
        if tokens.matched() > 0 {
            return Some((CoordinateEncoding::TokenGrammar, tokens));
        }
        if looks_bracketed(text) {
            let pairs = grammar::bracket_pairs(&braces_to_brackets(text));
            if pairs.matched() > 0 {
                return Some((CoordinateEncoding::BracketPairs, pairs));
            }
        }
        None
    }

    fn parse_element(value: &Value, out: &mut Vec<Point>) -> bool {
        let pair = match value {
            Value::Object(map) => map.get("x").zip(map.get("y")),
            Value::Array(items) if items.len() == 2 => Some((&items[0], &items[1])),
            _ => None,
        };
        let point = pair.and_then(|(x, y)| {
            Some(Point {
                x: coerce_int(x)?,
                y: coerce_int(y)?,
            })
        });
        match point {
            Some(p) => {
                out.push(p);
                true
            }
            None => false,
        }
    }
}

impl SubfieldGrammar for Timestamps {
    type Item = i64;
    type Encoding = TimestampEncoding;

    const FIELD: Field = Field::Timestamps;
    const STRUCTURED: TimestampEncoding = TimestampEncoding::Structured;

    fn parse_text(text: &str) -> Option<(TimestampEncoding, Scan<i64>)> {
        let mut scan = Scan::default();
        for token in strip_delimiters(text).split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }
            match token.parse::<i64>() {
                Ok(t) => scan.values.push(t),
                Err(_) => scan.dropped += 1,
            }
        }
        if scan.values.is_empty() {
            return None;
        }
        Some((TimestampEncoding::Delimited, scan))
    }

    fn parse_element(value: &Value, out: &mut Vec<i64>) -> bool {
        match coerce_int(value) {
            Some(t) => {
                out.push(t);
                true
            }
            None => false,
        }
    }
}

impl SubfieldGrammar for Actions {
    type Item = ActionToken;
    type Encoding = ActionEncoding;

    const FIELD: Field = Field::Actions;
    const STRUCTURED: ActionEncoding = ActionEncoding::Structured;

    fn parse_text(text: &str) -> Option<(ActionEncoding, Scan<ActionToken>)> {
        let scan = grammar::action_tokens(text);
        if scan.matched() == 0 {
            return None;
        }
        Some((ActionEncoding::TokenStream, scan))
    }

    fn parse_element(value: &Value, out: &mut Vec<ActionToken>) -> bool {
        let Value::String(token) = value else {
            return false;
        };
        let scan = grammar::action_tokens(token);
        if scan.values.is_empty() {
            return false;
        }
        out.extend(scan.values);
        true
    }
}

/// Probes the JSON shape of one sub-field and dispatches to its grammar.
pub(crate) fn parse_field<G: SubfieldGrammar>(
    value: Option<&Value>,
) -> (Vec<G::Item>, FieldReport<G::Encoding>) {
    match value {
        None | Some(Value::Null) => (Vec::new(), FieldReport::absent()),
        Some(Value::String(s)) if s.trim().is_empty() => (Vec::new(), FieldReport::absent()),
        Some(Value::String(s)) => {
            let text = repair_object_separators(s);
            match G::parse_text(&text) {
                Some((encoding, scan)) => {
                    let report = FieldReport::parsed(encoding, scan.values.len(), scan.dropped);
                    (scan.values, report)
                }
                None => (
                    Vec::new(),
                    FieldReport::malformed(
                        G::FIELD,
                        format!("no recognisable tokens in {}-byte string", s.len()),
                    ),
                ),
            }
        }
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            let mut dropped = 0;
            for item in items {
                if !G::parse_element(item, &mut values) {
                    dropped += 1;
                }
            }
            let report = FieldReport::parsed(G::STRUCTURED, values.len(), dropped);
            (values, report)
        }
        Some(other) => (
            Vec::new(),
            FieldReport::malformed(G::FIELD, format!("unsupported JSON {}", json_kind(other))),
        ),
    }
}

/// Integer coercion for structured elements: integers, integral floats and
/// numeric strings.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
