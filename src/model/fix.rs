//! model::fix
//!
//! Structured fix records and response normalization.
//!
//! # Design
//!
//! The reasoning service is asked for strict JSON but sometimes wraps
//! it in prose or returns free text. Instead of inline exception
//! handling, the outcome is modeled as a tagged variant:
//!
//! - [`FixOutcome::Structured`] - the response parsed as a [`FixRecord`],
//!   either directly or from a JSON-shaped substring
//! - [`FixOutcome::Raw`] - nothing parseable; the original text is kept
//!
//! [`recover_fix`] collapses the outcome into a usable record, falling
//! back to a zero-confidence sentinel whose code equals the original
//! snippet when nothing could be parsed.

use serde::{Deserialize, Serialize};

/// Explanation text of the zero-confidence sentinel fix.
pub const FALLBACK_EXPLANATION: &str = "Could not generate fix";

/// Default explanation when the model omitted one.
pub const DEFAULT_EXPLANATION: &str = "No analysis generated.";

/// Default confidence when the model omitted one.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// A structured fix as produced by the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    /// Corrected code; empty when the model gave none.
    #[serde(default)]
    pub code: String,
    /// Explanation of the fix.
    #[serde(default = "default_explanation")]
    pub explanation: String,
    /// Standards references (e.g. CWE/OWASP identifiers).
    #[serde(default)]
    pub references: Vec<String>,
    /// Fix confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_explanation() -> String {
    DEFAULT_EXPLANATION.to_string()
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl FixRecord {
    /// The zero-confidence sentinel for an unparseable response.
    ///
    /// Its `code` is the finding's original snippet so downstream
    /// consumers always have something syntactically meaningful.
    pub fn sentinel(original_snippet: &str) -> Self {
        Self {
            code: original_snippet.to_string(),
            explanation: FALLBACK_EXPLANATION.to_string(),
            references: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Whether this is the unparseable-response sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.confidence == 0.0 && self.explanation == FALLBACK_EXPLANATION
    }
}

/// Outcome of interpreting a generation response.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// The response carried a parseable fix record.
    Structured(FixRecord),
    /// The response was free text with no recoverable JSON.
    Raw(String),
}

/// Interpret a generation response as a fix record if possible.
///
/// Tries, in order:
/// 1. the whole text as JSON
/// 2. the substring from the first `{` to the last `}` as JSON
///
/// Anything else is [`FixOutcome::Raw`].
///
/// # Example
///
/// ```
/// use mender::model::{classify_response, FixOutcome};
///
/// let wrapped = "Here you go:\n{\"code\": \"x = 1\", \"confidence\": 0.9}\nCheers";
/// match classify_response(wrapped) {
///     FixOutcome::Structured(fix) => assert_eq!(fix.code, "x = 1"),
///     FixOutcome::Raw(_) => panic!("should recover embedded JSON"),
/// }
///
/// assert!(matches!(classify_response("no json here"), FixOutcome::Raw(_)));
/// ```
pub fn classify_response(text: &str) -> FixOutcome {
    if let Ok(fix) = serde_json::from_str::<FixRecord>(text) {
        return FixOutcome::Structured(fix);
    }

    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
        if open < close {
            if let Ok(fix) = serde_json::from_str::<FixRecord>(&text[open..=close]) {
                return FixOutcome::Structured(fix);
            }
        }
    }

    FixOutcome::Raw(text.to_string())
}

/// Collapse an outcome into a usable fix record.
///
/// A raw outcome becomes the zero-confidence sentinel carrying the
/// finding's original snippet. This function cannot fail.
///
/// # Example
///
/// ```
/// use mender::model::{classify_response, recover_fix};
///
/// let fix = recover_fix(classify_response("∅ nothing structured"), "orig()");
/// assert_eq!(fix.code, "orig()");
/// assert_eq!(fix.confidence, 0.0);
/// ```
pub fn recover_fix(outcome: FixOutcome, original_snippet: &str) -> FixRecord {
    match outcome {
        FixOutcome::Structured(fix) => fix,
        FixOutcome::Raw(_) => FixRecord::sentinel(original_snippet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json() {
        let text = r#"{"code": "safe()", "explanation": "e", "references": ["CWE-89"], "confidence": 0.95}"#;
        match classify_response(text) {
            FixOutcome::Structured(fix) => {
                assert_eq!(fix.code, "safe()");
                assert_eq!(fix.references, vec!["CWE-89"]);
                assert_eq!(fix.confidence, 0.95);
            }
            FixOutcome::Raw(_) => panic!("strict JSON should parse"),
        }
    }

    #[test]
    fn recovers_json_wrapped_in_prose() {
        let text = "Sure! Here is the fix:\n```json\n{\"code\": \"safe()\"}\n```\nHope that helps.";
        match classify_response(text) {
            FixOutcome::Structured(fix) => assert_eq!(fix.code, "safe()"),
            FixOutcome::Raw(_) => panic!("embedded JSON should be recovered"),
        }
    }

    #[test]
    fn defaults_fill_missing_fields() {
        match classify_response("{}") {
            FixOutcome::Structured(fix) => {
                assert_eq!(fix.code, "");
                assert_eq!(fix.explanation, DEFAULT_EXPLANATION);
                assert!(fix.references.is_empty());
                assert_eq!(fix.confidence, DEFAULT_CONFIDENCE);
            }
            FixOutcome::Raw(_) => panic!("empty object is structured"),
        }
    }

    #[test]
    fn free_text_is_raw() {
        assert!(matches!(
            classify_response("I cannot produce a fix for this."),
            FixOutcome::Raw(_)
        ));
    }

    #[test]
    fn unbalanced_braces_are_raw() {
        assert!(matches!(classify_response("} {"), FixOutcome::Raw(_)));
        assert!(matches!(classify_response("{ not json"), FixOutcome::Raw(_)));
    }

    #[test]
    fn recover_falls_back_to_sentinel() {
        let fix = recover_fix(FixOutcome::Raw("junk".into()), "orig()");
        assert!(fix.is_sentinel());
        assert_eq!(fix.code, "orig()");
        assert_eq!(fix.explanation, FALLBACK_EXPLANATION);
        assert!(fix.references.is_empty());
    }

    #[test]
    fn recover_passes_structured_through() {
        let record = FixRecord {
            code: "x".into(),
            explanation: "e".into(),
            references: vec![],
            confidence: 0.4,
        };
        let fix = recover_fix(FixOutcome::Structured(record.clone()), "orig");
        assert_eq!(fix, record);
        assert!(!fix.is_sentinel());
    }
}
