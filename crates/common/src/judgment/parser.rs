//! Model-response parser
//!
//! Turns the raw text a judgment model replies with into a [`Judgment`].
//! Anything that cannot be read as `{"score": <int>, "summary": ...}` yields
//! `None`; parsing never fails with an error.

use super::Judgment;
use regex_lite::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const MIN_SCORE: i64 = 0;
const MAX_SCORE: i64 = 10;

fn fence_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let open = Regex::new(r"^```\w*\n?").ok()?;
            let close = Regex::new(r"\n?```$").ok()?;
            Some((open, close))
        })
        .as_ref()
}

/// Strip one leading fence line (with optional language tag) and one
/// trailing fence. Text that does not open with a fence is left alone.
fn strip_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }
    match fence_patterns() {
        Some((open, close)) => {
            let without_open = open.replace(text, "");
            close.replace(&without_open, "").trim().to_string()
        }
        None => text.to_string(),
    }
}

/// Integers pass through, floats truncate toward zero, strings must hold an
/// integer literal. Everything else is rejected.
fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                let f = n.as_f64()?;
                f.is_finite().then(|| f.trunc() as i64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn render_summary(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse a raw model reply into a judgment
pub fn parse_judgment(raw: &str) -> Option<Judgment> {
    let text = strip_fences(raw);
    let value: Value = serde_json::from_str(&text).ok()?;
    let object = value.as_object()?;

    let score = coerce_score(object.get("score")?)?.clamp(MIN_SCORE, MAX_SCORE);
    let summary = render_summary(object.get("summary"));

    Some(Judgment {
        score: score as u8,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Option<(u8, String)> {
        parse_judgment(raw).map(|j| (j.score, j.summary))
    }

    #[test]
    fn test_plain_and_fenced_parse_alike() {
        let expected = Some((7, "x".to_string()));
        assert_eq!(parsed(r#"{"score": 7, "summary": "x"}"#), expected);
        assert_eq!(parsed("```json\n{\"score\": 7, \"summary\": \"x\"}\n```"), expected);
        assert_eq!(parsed("```\n{\"score\": 7, \"summary\": \"x\"}\n```"), expected);
        assert_eq!(parsed("  \n```json\n{\"score\": 7, \"summary\": \"x\"}```\n "), expected);
    }

    #[test]
    fn test_closing_fence_without_opening_is_kept() {
        assert_eq!(parsed("{\"score\": 7, \"summary\": \"x\"}\n```"), None);
        assert_eq!(parsed("{\"score\": 7}```"), None);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(parsed(r#"{"score": 15, "summary": "s"}"#).map(|p| p.0), Some(10));
        assert_eq!(parsed(r#"{"score": -5, "summary": "s"}"#).map(|p| p.0), Some(0));
    }

    #[test]
    fn test_score_coercion() {
        assert_eq!(parsed(r#"{"score": "8"}"#), Some((8, String::new())));
        assert_eq!(parsed(r#"{"score": 7.5, "summary": "s"}"#).map(|p| p.0), Some(7));
        assert_eq!(parsed(r#"{"score": -0.5}"#).map(|p| p.0), Some(0));
        assert_eq!(parsed(r#"{"score": 1e300}"#).map(|p| p.0), Some(10));
    }

    #[test]
    fn test_uncoercible_score_discards_summary() {
        assert_eq!(parsed(r#"{"score": "eight", "summary": "great"}"#), None);
        assert_eq!(parsed(r#"{"score": true, "summary": "great"}"#), None);
        assert_eq!(parsed(r#"{"score": null, "summary": "great"}"#), None);
        assert_eq!(parsed(r#"{"score": [7]}"#), None);
        assert_eq!(parsed(r#"{"summary": "no score"}"#), None);
    }

    #[test]
    fn test_summary_rendering() {
        assert_eq!(parsed(r#"{"score": 3, "summary": null}"#), Some((3, String::new())));
        assert_eq!(parsed(r#"{"score": 3, "summary": 42}"#), Some((3, "42".to_string())));
        assert_eq!(
            parsed(r#"{"score": 3, "summary": ["a", "b"]}"#),
            Some((3, r#"["a","b"]"#.to_string()))
        );
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(parsed(""), None);
        assert_eq!(parsed("I think this paper is a 7."), None);
        assert_eq!(parsed("[7, \"x\"]"), None);
        assert_eq!(parsed("{\"score\": 7,"), None);
    }
}
