//! Display configuration loading and validation.
//!
//! This module handles:
//! - Loading `config.toml` (or `.json`) files
//! - Config resolution order (CLI > env > XDG > defaults)
//! - Schema validation (shape/type checking via serde)
//! - Semantic validation (tier ordering, positive interval, usable width)

use crate::render::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "ptree";

/// Default config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PTREE_CONFIG";

/// Narrowest command-line width that still leaves room for `...`.
pub const MIN_CMDLINE_WIDTH: usize = 8;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file {path}: {source}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in config file {path}: {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Thresholds(String),

    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("cannot serialize config: {0}")]
    Serialize(String),
}

impl From<ConfigError> for pt_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Thresholds(message) => pt_common::Error::InvalidThresholds(message),
            other => pt_common::Error::Config(other.to_string()),
        }
    }
}

/// User-tunable display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Maximum command-line characters in verbose mode.
    pub cmdline_width: usize,

    /// Seconds between monitor refreshes.
    pub interval_secs: f64,

    /// Root of the proc filesystem.
    pub proc_root: PathBuf,

    /// Colour output when stdout is a terminal.
    pub color: bool,

    /// Severity tier boundaries for memory and CPU.
    pub thresholds: Thresholds,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cmdline_width: 80,
            interval_secs: 2.0,
            proc_root: PathBuf::from("/proc"),
            color: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl DisplayConfig {
    /// Semantic checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.memory_medium_mb < t.memory_high_mb) {
            return Err(ConfigError::Thresholds(format!(
                "memory_medium_mb ({}) must be below memory_high_mb ({})",
                t.memory_medium_mb, t.memory_high_mb
            )));
        }
        if !(t.cpu_medium_percent < t.cpu_high_percent) {
            return Err(ConfigError::Thresholds(format!(
                "cpu_medium_percent ({}) must be below cpu_high_percent ({})",
                t.cpu_medium_percent, t.cpu_high_percent
            )));
        }
        if t.memory_medium_mb < 0.0 || t.cpu_medium_percent < 0.0 {
            return Err(ConfigError::Thresholds(
                "thresholds must not be negative".to_string(),
            ));
        }
        if self.cmdline_width < MIN_CMDLINE_WIDTH {
            return Err(ConfigError::Invalid {
                field: "cmdline_width",
                message: format!("must be at least {}", MIN_CMDLINE_WIDTH),
            });
        }
        if !(self.interval_secs > 0.0 && self.interval_secs.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "interval_secs",
                message: format!("must be a positive number of seconds, got {}", self.interval_secs),
            });
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// `--config` flag.
    Explicit(PathBuf),
    /// `PTREE_CONFIG` environment variable.
    Env(PathBuf),
    /// `$XDG_CONFIG_HOME/ptree/config.toml`.
    UserDir(PathBuf),
    /// Built-in defaults.
    Defaults,
}

impl ConfigOrigin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigOrigin::Explicit(p) | ConfigOrigin::Env(p) | ConfigOrigin::UserDir(p) => Some(p),
            ConfigOrigin::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOrigin::Explicit(p) => write!(f, "{} (--config)", p.display()),
            ConfigOrigin::Env(p) => write!(f, "{} ({})", p.display(), CONFIG_ENV),
            ConfigOrigin::UserDir(p) => write!(f, "{}", p.display()),
            ConfigOrigin::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: DisplayConfig,
    pub origin: ConfigOrigin,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file path (highest priority).
    pub config_path: Option<PathBuf>,
    /// Override for the config home directory (instead of XDG lookup).
    pub config_home: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flag (via ConfigOptions)
/// 2. Environment variable (PTREE_CONFIG)
/// 3. XDG config home (~/.config/ptree/config.toml), skipped if absent
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let origin = resolve_config_origin(options);

    let config = match &origin {
        ConfigOrigin::Explicit(path) | ConfigOrigin::Env(path) => load_config_file(path)?,
        ConfigOrigin::UserDir(path) if path.exists() => load_config_file(path)?,
        ConfigOrigin::UserDir(_) | ConfigOrigin::Defaults => DisplayConfig::default(),
    };

    let origin = match origin {
        ConfigOrigin::UserDir(path) if !path.exists() => ConfigOrigin::Defaults,
        other => other,
    };

    Ok(ResolvedConfig { config, origin })
}

fn resolve_config_origin(options: &ConfigOptions) -> ConfigOrigin {
    // 1. Explicit option
    if let Some(path) = &options.config_path {
        return ConfigOrigin::Explicit(path.clone());
    }

    // 2. Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return ConfigOrigin::Env(PathBuf::from(path));
        }
    }

    // 3. XDG config home
    let config_home = options.config_home.clone().unwrap_or_else(|| {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            })
    });

    ConfigOrigin::UserDir(config_home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load and validate a specific file. `.json` is parsed as JSON, anything else as TOML.
pub fn load_config_file(path: &Path) -> Result<DisplayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: DisplayConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::JsonError {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.to_path_buf(),
            source: e,
        })?
    };

    config.validate()?;
    Ok(config)
}
