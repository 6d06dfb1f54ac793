//! Token grammar: `m(x,y)` moves, `c(k)` clicks and bare `[x,y]` pairs.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::{ActionToken, Point};

static MOVE_TOKEN: OnceLock<Regex> = OnceLock::new();
static BRACKET_PAIR: OnceLock<Regex> = OnceLock::new();
static ACTION_TOKEN: OnceLock<Regex> = OnceLock::new();

fn move_token() -> &'static Regex {
    MOVE_TOKEN.get_or_init(|| {
        Regex::new(r"m\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)").expect("move token pattern")
    })
}

fn bracket_pair() -> &'static Regex {
    BRACKET_PAIR.get_or_init(|| {
        Regex::new(r"\[\s*(-?\d+)\s*,\s*(-?\d+)\s*\]").expect("bracket pair pattern")
    })
}

fn action_token() -> &'static Regex {
    ACTION_TOKEN.get_or_init(|| {
        Regex::new(r"c\(([^()])\)|m\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)").expect("action token pattern")
    })
}

/// Values recovered from one scan plus the matches that had to be thrown
/// away (integer overflow).
#[derive(Debug)]
pub(crate) struct Scan<T> {
    pub values: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for Scan<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            dropped: 0,
        }
    }
}

impl<T> Scan<T> {
    pub fn matched(&self) -> usize {
        self.values.len() + self.dropped
    }
}

fn point(caps: &Captures<'_>, x: usize, y: usize) -> Option<Point> {
    let x = caps.get(x)?.as_str().parse().ok()?;
    let y = caps.get(y)?.as_str().parse().ok()?;
    Some(Point { x, y })
}

fn scan_points(re: &Regex, text: &str) -> Scan<Point> {
    let mut scan = Scan::default();
    for caps in re.captures_iter(text) {
        match point(&caps, 1, 2) {
            Some(p) => scan.values.push(p),
            None => scan.dropped += 1,
        }
    }
    scan
}

pub(crate) fn move_tokens(text: &str) -> Scan<Point> {
    scan_points(move_token(), text)
}

pub(crate) fn bracket_pairs(text: &str) -> Scan<Point> {
    scan_points(bracket_pair(), text)
}

pub(crate) fn action_tokens(text: &str) -> Scan<ActionToken> {
    let mut scan = Scan::default();
    for caps in action_token().captures_iter(text) {
        if let Some(key) = caps.get(1) {
            match key.as_str().chars().next() {
                Some(c) => scan.values.push(ActionToken::Click(c)),
                None => scan.dropped += 1,
            }
            continue;
        }
        match point(&caps, 2, 3) {
            Some(p) => scan.values.push(ActionToken::Move(p)),
            None => scan.dropped += 1,
        }
    }
    scan
}
