//! Where ptree's diagnostics go and how loud they are.
//!
//! Level: `--log-level`/`-q`, else `PTREE_LOG`, else `RUST_LOG`, else `warn`.
//! Format: `--log-format`, else `PTREE_LOG_FORMAT`, else human text.

use serde::{Deserialize, Serialize};

pub const LOG_ENV: &str = "PTREE_LOG";
pub const LOG_FORMAT_ENV: &str = "PTREE_LOG_FORMAT";

/// Shape of each diagnostic line on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("expected human or jsonl, got '{}'", other)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity threshold. `Warn` keeps stderr quiet around the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    /// Collection, forest and monitor-cycle summaries.
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Most verbose first, so a directive scan can stop at the first hit.
    const BY_VERBOSITY: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Loudest level named anywhere in an `EnvFilter`-style directive string,
    /// e.g. `pt_core=info,hyper=warn` gives `Info`.
    fn loudest_in(directives: &str) -> Option<LogLevel> {
        let directives = directives.to_ascii_lowercase();
        Self::BY_VERBOSITY
            .into_iter()
            .find(|level| directives.contains(level.as_str()))
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" => Ok(LogLevel::Warn),
            "off" | "quiet" => Ok(LogLevel::Off),
            other => Self::BY_VERBOSITY
                .into_iter()
                .find(|level| level.as_str() == other)
                .ok_or_else(|| format!("unknown log level '{}'", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Human format only; JSONL always carries a timestamp.
    pub timestamps: bool,
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Warn,
            timestamps: true,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Resolve against the process environment. `None` flags defer to it.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::resolve(
            var(LOG_ENV).as_deref(),
            var("RUST_LOG").as_deref(),
            var(LOG_FORMAT_ENV).as_deref(),
            cli_level,
            cli_format,
        )
    }

    fn resolve(
        ptree_log: Option<&str>,
        rust_log: Option<&str>,
        log_format: Option<&str>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        // An unparseable PTREE_LOG still shadows RUST_LOG.
        let env_level = match ptree_log {
            Some(value) => value.parse().ok(),
            None => rust_log.and_then(LogLevel::loudest_in),
        };
        let defaults = LogConfig::default();
        LogConfig {
            level: cli_level.or(env_level).unwrap_or(defaults.level),
            format: cli_format
                .or_else(|| log_format.and_then(|value| value.parse().ok()))
                .unwrap_or(defaults.format),
            ..defaults
        }
    }
}
