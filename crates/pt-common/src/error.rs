//! Error types for the process tree tools.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! Errors can be formatted for human consumption with headline, reason, and fix:
//! ```text
//! ✗ Process Source Unavailable
//!   Reason: process source unavailable: cannot read /proc: permission denied
//!   Fix: Check that /proc is mounted and readable, or point --proc-root at a readable tree.
//! ```
//!
//! # Machine-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 21,
//!   "category": "collection",
//!   "message": "process 4242 not found",
//!   "recoverable": false,
//!   "suggested_action": "rescan",
//!   "context": { "pid": 4242 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for process tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors (syntax, thresholds).
    Config,
    /// Process enumeration and collection errors.
    Collection,
    /// Pid lookups and searches that matched nothing.
    Query,
    /// File I/O and serialization errors.
    Io,
    /// Platform compatibility errors.
    Platform,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Query => write!(f, "query"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Platform => write!(f, "platform"),
        }
    }
}

/// Suggested follow-up for callers reacting to an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation (possibly after the next refresh interval).
    Retry,
    /// Run config validation.
    RunCheck,
    /// Take a fresh snapshot.
    Rescan,
    /// Request elevated privileges.
    Elevate,
    /// Skip this item and continue.
    Skip,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::Rescan => write!(f, "rescan"),
            SuggestedAction::Elevate => write!(f, "elevate"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for the process tree tools.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid display thresholds: {0}")]
    InvalidThresholds(String),

    // Collection errors (20-29)
    #[error("process source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("permission denied accessing process {pid}")]
    PermissionDenied { pid: u32 },

    // Query outcomes (30-39)
    #[error("no processes found matching '{query}'")]
    NoMatch { query: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot file error: {0}")]
    Snapshot(String),

    // Platform errors (70-79)
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Collection errors
    /// - 30-39: Query outcomes
    /// - 60-69: I/O errors
    /// - 70-79: Platform errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidThresholds(_) => 11,
            Error::SourceUnavailable(_) => 20,
            Error::ProcessNotFound { .. } => 21,
            Error::PermissionDenied { .. } => 22,
            Error::NoMatch { .. } => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Snapshot(_) => 62,
            Error::UnsupportedPlatform(_) => 70,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidThresholds(_) => ErrorCategory::Config,

            Error::SourceUnavailable(_)
            | Error::ProcessNotFound { .. }
            | Error::PermissionDenied { .. } => ErrorCategory::Collection,

            Error::NoMatch { .. } => ErrorCategory::Query,

            Error::Io(_) | Error::Json(_) | Error::Snapshot(_) => ErrorCategory::Io,

            Error::UnsupportedPlatform(_) => ErrorCategory::Platform,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// A process table changes constantly, so most collection errors clear up
    /// on the next snapshot.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidThresholds(_) => true,

            Error::SourceUnavailable(_) => true, // Next interval retries
            Error::ProcessNotFound { .. } => false, // Process is gone
            Error::PermissionDenied { .. } => true, // Can elevate

            Error::NoMatch { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
            Error::Snapshot(_) => true,

            Error::UnsupportedPlatform(_) => false,
        }
    }

    /// Returns the suggested follow-up action.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidThresholds(_) => SuggestedAction::RunCheck,

            Error::SourceUnavailable(_) => SuggestedAction::Retry,
            Error::ProcessNotFound { .. } => SuggestedAction::Rescan,
            Error::PermissionDenied { .. } => SuggestedAction::Elevate,

            Error::NoMatch { .. } => SuggestedAction::Skip,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
            Error::Snapshot(_) => SuggestedAction::Rescan,

            Error::UnsupportedPlatform(_) => SuggestedAction::Abort,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'ptree config validate' to check the config file, or remove it to use defaults."
            }
            Error::InvalidThresholds(_) => {
                "Medium thresholds must be below high thresholds. Fix the [thresholds] table in the config file."
            }

            Error::SourceUnavailable(_) => {
                "Check that /proc is mounted and readable, or point --proc-root at a readable tree."
            }
            Error::ProcessNotFound { .. } => {
                "The process exited between collection and query. This is normal for short-lived processes."
            }
            Error::PermissionDenied { .. } => {
                "Run with elevated privileges to read details of processes owned by other users."
            }

            Error::NoMatch { .. } => {
                "Check the spelling of the name, or search by pid. Name matching is case-insensitive."
            }

            Error::Io(_) => {
                "Check disk space, permissions, and that the target directory exists. Retry the operation."
            }
            Error::Json(_) => {
                "Invalid JSON in file. Check syntax with 'jq . <file>' or capture a fresh snapshot."
            }
            Error::Snapshot(_) => {
                "Capture a fresh snapshot with --save-snapshot and replay that file instead."
            }

            Error::UnsupportedPlatform(_) => {
                "Live collection needs a Linux /proc filesystem. Use --replay with a saved snapshot instead."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidThresholds(_) => "Invalid Display Thresholds",

            Error::SourceUnavailable(_) => "Process Source Unavailable",
            Error::ProcessNotFound { .. } => "Process Not Found",
            Error::PermissionDenied { .. } => "Permission Denied",

            Error::NoMatch { .. } => "No Matching Processes",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
            Error::Snapshot(_) => "Snapshot File Error",

            Error::UnsupportedPlatform(_) => "Unsupported Platform",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested follow-up action.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., pid, query).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::ProcessNotFound { pid } | Error::PermissionDenied { pid } => {
                context.insert("pid".to_string(), serde_json::json!(pid));
            }
            Error::NoMatch { query } => {
                context.insert("query".to_string(), serde_json::json!(query));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(Error::ProcessNotFound { pid: 123 }.code(), 21);
        assert_eq!(Error::NoMatch { query: "x".into() }.code(), 30);
        assert_eq!(Error::Snapshot("bad".into()).code(), 62);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::ProcessNotFound { pid: 123 }.category(),
            ErrorCategory::Collection
        );
        assert_eq!(
            Error::SourceUnavailable("denied".into()).category(),
            ErrorCategory::Collection
        );
        assert_eq!(
            Error::NoMatch { query: "x".into() }.category(),
            ErrorCategory::Query
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::Config("test".into()).is_recoverable());
        assert!(!Error::ProcessNotFound { pid: 123 }.is_recoverable());
        assert!(Error::SourceUnavailable("busy".into()).is_recoverable());
        assert!(!Error::UnsupportedPlatform("plan9".into()).is_recoverable());
    }

    #[test]
    fn test_suggested_action() {
        assert_eq!(
            Error::PermissionDenied { pid: 123 }.suggested_action(),
            SuggestedAction::Elevate
        );
        assert_eq!(
            Error::ProcessNotFound { pid: 123 }.suggested_action(),
            SuggestedAction::Rescan
        );
        assert_eq!(
            Error::SourceUnavailable("x".into()).suggested_action(),
            SuggestedAction::Retry
        );
    }

    #[test]
    fn test_structured_error_from_error() {
        let err = Error::ProcessNotFound { pid: 12345 };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 21);
        assert_eq!(structured.category, ErrorCategory::Collection);
        assert!(!structured.recoverable);
        assert_eq!(structured.suggested_action, SuggestedAction::Rescan);
        assert_eq!(
            structured.context.get("pid"),
            Some(&serde_json::json!(12345))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::NoMatch {
            query: "chrome".into(),
        };
        let structured = StructuredError::from(&err).with_context("mode", "search");
        let json = structured.to_json();

        assert!(json.contains(r#""code":30"#));
        assert!(json.contains(r#""category":"query""#));
        assert!(json.contains(r#""suggested_action":"skip""#));
        assert!(json.contains(r#""query":"chrome""#));
        assert!(json.contains(r#""mode":"search""#));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::PermissionDenied { pid: 1234 };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Permission Denied"));
        assert!(formatted.contains("permission denied accessing process 1234"));
        assert!(formatted.contains("elevated privileges"));
        assert!(!formatted.contains('\x1b'));
    }

    #[test]
    fn test_format_error_human_color() {
        let err = Error::SourceUnavailable("cannot read /proc".into());
        let formatted = format_error_human(&err, true);
        assert!(formatted.starts_with("\x1b[31m✗\x1b[0m"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Config.to_string(), "config");
        assert_eq!(ErrorCategory::Query.to_string(), "query");
    }

    #[test]
    fn test_suggested_action_display() {
        assert_eq!(SuggestedAction::Retry.to_string(), "retry");
        assert_eq!(SuggestedAction::RunCheck.to_string(), "run_check");
    }
}
