//! Text repairs applied before any structural or grammar parse.

use std::borrow::Cow;

/// Object separator emitted by one upstream client when it concatenates a
/// line-delimited object stream: the comma after the closing brace is lost.
pub const BROKEN_SEPARATOR: &str = "}\"";
pub const REPAIRED_SEPARATOR: &str = "},\"";

/// Rewrites every `}"` to `},"`. Borrows when there is nothing to repair.
///
/// The token grammar never looks at quote characters, so the rewrite is
/// applied unconditionally to documents and string sub-fields alike.
pub fn repair_object_separators(text: &str) -> Cow<'_, str> {
    if text.contains(BROKEN_SEPARATOR) {
        Cow::Owned(text.replace(BROKEN_SEPARATOR, REPAIRED_SEPARATOR))
    } else {
        Cow::Borrowed(text)
    }
}

/// True when the text is wrapped in a matching `[..]` or `{..}` pair
/// (trailing commas left over from separator repair are ignored).
pub(crate) fn looks_bracketed(text: &str) -> bool {
    let t = text.trim().trim_end_matches(',').trim_end();
    matches!(
        (t.chars().next(), t.chars().last()),
        (Some('['), Some(']')) | (Some('{'), Some('}'))
    )
}

pub(crate) fn braces_to_brackets(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '{' => '[',
            '}' => ']',
            other => other,
        })
        .collect()
}

/// Drops every bracket, brace and parenthesis character.
pub(crate) fn strip_delimiters(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}' | '(' | ')'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_broken_separator() {
        let text = r#"{"a":{"b":1}"c":2}"#;
        assert_eq!(repair_object_separators(text), r#"{"a":{"b":1},"c":2}"#);
    }

    #[test]
    fn repair_borrows_clean_text() {
        let text = r#"{"a":1}"#;
        assert!(matches!(repair_object_separators(text), Cow::Borrowed(_)));
    }

    #[test]
    fn repair_is_idempotent() {
        let once = repair_object_separators(r#"x}"y}"z"#).into_owned();
        let twice = repair_object_separators(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn bracketed_wrappers() {
        assert!(looks_bracketed("[[1,2],[3,4]]"));
        assert!(looks_bracketed(" {[1,2],[3,4]}, "));
        assert!(!looks_bracketed("m(1,2)"));
        assert!(!looks_bracketed(""));
    }

    #[test]
    fn mismatched_wrappers_are_not_bracketed() {
        assert!(!looks_bracketed("[1,2],[3,4]}"));
        assert!(!looks_bracketed("{[1,2],[3,4]]"));
        assert!(!looks_bracketed("["));
    }

    #[test]
    fn strips_delimiters() {
        assert_eq!(strip_delimiters("{[(1,2)]}"), "1,2");
    }
}
