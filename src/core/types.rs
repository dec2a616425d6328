//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ScanId`] - Validated scan identifier
//! - [`Severity`] - Normalized finding severity
//! - [`Stage`] - Pipeline stage that last wrote a document
//! - [`DocumentStatus`] - Coarse pipeline phase of a document
//! - [`ReviewState`] - Approval gate state of a finding
//!
//! # Validation
//!
//! [`ScanId`] enforces validity at construction time. Invalid values
//! cannot be represented, so storage keys derived from a scan id are
//! always safe to use as relative paths.
//!
//! # Examples
//!
//! ```
//! use mender::core::types::{ScanId, Severity};
//!
//! let id = ScanId::new("scan_0a1b2c3d4e5f").unwrap();
//! assert_eq!(id.as_str(), "scan_0a1b2c3d4e5f");
//!
//! // Invalid constructions fail at creation time
//! assert!(ScanId::new("").is_err());
//! assert!(ScanId::new("../escape").is_err());
//!
//! // Tool severity labels normalize deterministically
//! assert_eq!(Severity::from_tool_label("ERROR"), Severity::High);
//! assert_eq!(Severity::from_tool_label("nonsense"), Severity::Unknown);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid scan id: {0}")]
    InvalidScanId(String),
}

/// A validated scan identifier.
///
/// Scan ids name pipeline runs and become part of storage keys
/// (`scan-results/<id>/result.json`), so the allowed alphabet is
/// restricted to ASCII alphanumerics, `_`, and `-`:
/// - Cannot be empty
/// - Cannot exceed 64 characters
/// - Cannot contain path separators or any other punctuation
///
/// # Example
///
/// ```
/// use mender::core::types::ScanId;
///
/// let id = ScanId::new("scan_deadbeef0123").unwrap();
/// assert_eq!(id.as_str(), "scan_deadbeef0123");
///
/// assert!(ScanId::new("has space").is_err());
/// assert!(ScanId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScanId(String);

impl ScanId {
    /// Maximum accepted length for a scan id.
    const MAX_LEN: usize = 64;

    /// Create a new validated scan id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidScanId` if the id is empty, too long,
    /// or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh unique scan id of the form `scan_<12 hex chars>`.
    ///
    /// # Example
    ///
    /// ```
    /// use mender::core::types::ScanId;
    ///
    /// let id = ScanId::generate();
    /// assert!(id.as_str().starts_with("scan_"));
    /// assert_eq!(id.as_str().len(), "scan_".len() + 12);
    /// ```
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("scan_{}", &hex[..12]))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidScanId("scan id cannot be empty".into()));
        }
        if id.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidScanId(format!(
                "scan id cannot exceed {} characters",
                Self::MAX_LEN
            )));
        }
        for c in id.chars() {
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(TypeError::InvalidScanId(format!(
                    "scan id cannot contain '{c}'"
                )));
            }
        }
        Ok(())
    }

    /// Get the scan id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key for this scan's result document.
    ///
    /// # Example
    ///
    /// ```
    /// use mender::core::types::ScanId;
    ///
    /// let id = ScanId::new("scan_0a1b2c3d4e5f").unwrap();
    /// assert_eq!(id.result_key(), "scan-results/scan_0a1b2c3d4e5f/result.json");
    /// ```
    pub fn result_key(&self) -> String {
        format!("scan-results/{}/result.json", self.0)
    }
}

impl TryFrom<String> for ScanId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ScanId> for String {
    fn from(id: ScanId) -> Self {
        id.0
    }
}

impl AsRef<str> for ScanId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized severity of a finding.
///
/// Derived from the scan tool's native severity label via a fixed mapping;
/// labels outside the mapping collapse to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Tool label `error`.
    High,
    /// Tool label `warning`.
    Medium,
    /// Tool label `info`.
    Low,
    /// Any other tool label.
    Unknown,
}

impl Severity {
    /// Map a tool-native severity label to a normalized severity.
    ///
    /// The comparison is case-insensitive.
    ///
    /// # Example
    ///
    /// ```
    /// use mender::core::types::Severity;
    ///
    /// assert_eq!(Severity::from_tool_label("error"), Severity::High);
    /// assert_eq!(Severity::from_tool_label("Warning"), Severity::Medium);
    /// assert_eq!(Severity::from_tool_label("INFO"), Severity::Low);
    /// assert_eq!(Severity::from_tool_label("experimental"), Severity::Unknown);
    /// ```
    pub fn from_tool_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "error" => Severity::High,
            "warning" => Severity::Medium,
            "info" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    /// Whether this severity participates in the named sub-counts
    /// (`high`/`medium`/`low`); `Unknown` does not.
    pub fn is_named(&self) -> bool {
        !matches!(self, Severity::Unknown)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// The pipeline stage that last wrote a scan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Scanner stage produced the document.
    Scanner,
    /// Analyzer stage enriched the document.
    Analyzer,
    /// Patch deployment touched the document.
    Deployer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Scanner => "scanner",
            Stage::Analyzer => "analyzer",
            Stage::Deployer => "deployer",
        };
        write!(f, "{s}")
    }
}

/// Coarse pipeline phase of a scan document, parallel to [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Initial scan completed.
    Scanned,
    /// Findings enriched with remediations.
    Analyzed,
    /// Patches applied to a working copy.
    Patched,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Scanned => "scanned",
            DocumentStatus::Analyzed => "analyzed",
            DocumentStatus::Patched => "patched",
        };
        write!(f, "{s}")
    }
}

/// Approval gate state of a finding.
///
/// A three-state enum instead of independent `approved`/`rejected`
/// booleans: the last gate action wins, so a finding is never both
/// approved and rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    /// No gate action has been taken.
    #[default]
    Pending,
    /// The remediation was approved.
    Approved,
    /// The remediation was rejected.
    Rejected,
}

impl ReviewState {
    /// Whether no gate action has been taken yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, ReviewState::Pending)
    }
}

/// Current UTC time as an RFC3339 string.
///
/// Every stage that writes a document stamps it with this.
pub fn now_utc_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
