//! `tracing` setup. Diagnostics always go to stderr so stdout stays a clean
//! tree or JSON document; each invocation runs inside a `run` span.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, LOG_ENV, LOG_FORMAT_ENV};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive covering the library and the binary.
pub fn filter_directive(level: LogLevel) -> String {
    format!("pt_core={level},ptree={level}", level = level)
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A second call
/// (tests, embedding) is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::new(filter_directive(config.level));

    match config.format {
        LogFormat::Human => {
            // Human-readable console format on stderr
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_ansi(use_ansi);

            if config.timestamps {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init();
            } else {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init();
            }
        }
        LogFormat::Jsonl => {
            // Machine-parseable JSONL on stderr
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init();
        }
    }
}

/// Initialize logging with defaults (for tests and simple cases).
pub fn init_default_logging() {
    let config = LogConfig::from_env(None, None);
    init_logging(&config);
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    // Shorten to first 12 hex chars for readability
    format!("run-{}", &uuid[..12])
}
