//! Exit codes for the ptree CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-6: Operational outcomes (a missing pid is an outcome, not an error)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, I/O failures)

/// Exit codes for ptree operations.
///
/// These codes are a stable contract for scripts wrapping the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-6)
    // ========================================================================
    /// Tree rendered
    Clean = 0,

    /// Requested pid or search term matched nothing
    NoMatch = 1,

    /// Stopped by SIGINT/SIGTERM before finishing
    Interrupted = 6,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Config file missing, malformed, or semantically invalid
    ConfigError = 11,

    /// Permission denied
    PermissionError = 12,

    /// Process enumeration failed (no readable /proc)
    SourceUnavailable = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error (export file, snapshot file)
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates a rendered result.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code is an operational outcome (codes 0-6).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        let code = self as i32;
        code >= 20
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NoMatch => "OK_NO_MATCH",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::SourceUnavailable => "ERR_SOURCE_UNAVAILABLE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&pt_common::Error> for ExitCode {
    fn from(err: &pt_common::Error) -> Self {
        use pt_common::Error;
        match err {
            Error::Config(_) | Error::InvalidThresholds(_) => ExitCode::ConfigError,
            Error::SourceUnavailable(_) => ExitCode::SourceUnavailable,
            Error::ProcessNotFound { .. } | Error::NoMatch { .. } => ExitCode::NoMatch,
            Error::PermissionDenied { .. } => ExitCode::PermissionError,
            Error::Io(_) | Error::Json(_) | Error::Snapshot(_) => ExitCode::IoError,
            Error::UnsupportedPlatform(_) => ExitCode::ArgsError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::NoMatch.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 6);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::PermissionError.as_i32(), 12);
        assert_eq!(ExitCode::SourceUnavailable.as_i32(), 14);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_ranges() {
        assert!(ExitCode::NoMatch.is_operational());
        assert!(!ExitCode::NoMatch.is_error());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(ExitCode::Clean.is_success());
    }

    #[test]
    fn test_from_error() {
        let err = pt_common::Error::SourceUnavailable("x".into());
        assert_eq!(ExitCode::from(&err), ExitCode::SourceUnavailable);
        let err = pt_common::Error::Config("bad".into());
        assert_eq!(ExitCode::from(&err), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::NoMatch.to_string(), "OK_NO_MATCH (1)");
    }
}
