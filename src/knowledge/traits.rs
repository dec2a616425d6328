//! knowledge::traits
//!
//! Knowledge retrieval trait definition.
//!
//! # Design
//!
//! The `KnowledgeBase` trait abstracts the external passage store that
//! supplies remediation context (CWE/OWASP material) for a
//! vulnerability. The trait is async because retrieval is network I/O.
//!
//! Relevance filtering is a standalone function ([`filter_passages`])
//! so the cutoff semantics are testable without a live service: a
//! passage survives only when its score is STRICTLY greater than
//! [`RELEVANCE_FLOOR`], and at most [`MAX_PASSAGES`] are kept.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum relevance score (exclusive) for a passage to be kept.
pub const RELEVANCE_FLOOR: f64 = 0.5;

/// Maximum number of passages kept per query.
pub const MAX_PASSAGES: usize = 5;

/// Errors from knowledge retrieval.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// The service returned an error response.
    #[error("retrieval API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Network or connection error.
    #[error("retrieval network error: {0}")]
    NetworkError(String),

    /// The response body was not in the expected shape.
    #[error("invalid retrieval response: {0}")]
    InvalidResponse(String),
}

/// A retrieval query against the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalQuery {
    /// Free-text query.
    pub query_text: String,
    /// Maximum results the service should return.
    pub max_results: u32,
}

impl RetrievalQuery {
    /// Build the remediation-guidance query for a vulnerability.
    ///
    /// # Example
    ///
    /// ```
    /// use mender::knowledge::RetrievalQuery;
    ///
    /// let q = RetrievalQuery::for_vulnerability("rules.sqli", "Tainted SQL string.");
    /// assert!(q.query_text.contains("Security vulnerability: rules.sqli"));
    /// assert!(q.query_text.contains("Tainted SQL string."));
    /// assert_eq!(q.max_results, 5);
    /// ```
    pub fn for_vulnerability(rule: &str, description: &str) -> Self {
        let query_text = format!(
            "Security vulnerability: {rule}\n\
             Description: {description}\n\n\
             Provide remediation guidance, best practices, and secure code examples."
        );
        Self {
            query_text,
            max_results: MAX_PASSAGES as u32,
        }
    }
}

/// One retrieved passage with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text.
    pub text: String,
    /// Relevance score in `[0, 1]`.
    pub score: f64,
    /// Source location, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Drop low-relevance passages and cap the result count.
///
/// Keeps passages whose score is strictly greater than
/// [`RELEVANCE_FLOOR`], ordered by descending score, at most
/// [`MAX_PASSAGES`] of them.
///
/// # Example
///
/// ```
/// use mender::knowledge::{filter_passages, Passage};
///
/// let passages = [0.9, 0.6, 0.5, 0.4, 0.3]
///     .into_iter()
///     .map(|score| Passage { text: format!("p{score}"), score, source: None })
///     .collect();
/// let kept = filter_passages(passages);
/// assert_eq!(kept.len(), 2); // 0.5 itself is excluded
/// assert_eq!(kept[0].score, 0.9);
/// ```
pub fn filter_passages(passages: Vec<Passage>) -> Vec<Passage> {
    let mut kept: Vec<Passage> = passages
        .into_iter()
        .filter(|p| p.score > RELEVANCE_FLOOR)
        .collect();
    kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    kept.truncate(MAX_PASSAGES);
    kept
}

/// The knowledge retrieval service.
///
/// Implementations must be `Send + Sync` to allow use across async
/// tasks. Returned passages are ranked but unfiltered; callers apply
/// [`filter_passages`].
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Retrieve ranked passages for a query.
    ///
    /// # Errors
    ///
    /// - `ApiError` when the service answers with an error status
    /// - `NetworkError` when it cannot be reached
    /// - `InvalidResponse` when the body cannot be decoded
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Passage>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(score: f64) -> Passage {
        Passage {
            text: format!("passage {score}"),
            score,
            source: None,
        }
    }

    #[test]
    fn floor_is_strict() {
        let kept = filter_passages(vec![passage(0.9), passage(0.6), passage(0.5), passage(0.4), passage(0.3)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.6);
    }

    #[test]
    fn caps_at_max_passages() {
        let kept = filter_passages((0..10).map(|i| passage(0.6 + i as f64 * 0.01)).collect());
        assert_eq!(kept.len(), MAX_PASSAGES);
    }

    #[test]
    fn orders_by_descending_score() {
        let kept = filter_passages(vec![passage(0.6), passage(0.9), passage(0.7)]);
        let scores: Vec<f64> = kept.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.6]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(filter_passages(Vec::new()).is_empty());
    }

    #[test]
    fn query_template_embeds_details() {
        let q = RetrievalQuery::for_vulnerability("rules.weak-hash", "MD5 in use.");
        assert!(q.query_text.starts_with("Security vulnerability: rules.weak-hash"));
        assert!(q.query_text.contains("Description: MD5 in use."));
        assert!(q
            .query_text
            .ends_with("Provide remediation guidance, best practices, and secure code examples."));
    }

    #[test]
    fn error_display() {
        let err = RetrievalError::ApiError {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "retrieval API error: 503 - overloaded");
    }
}
