//! Structured logging infrastructure.
//!
//! Uses the `tracing` and `tracing-subscriber` crates to provide structured,
//! async-aware logging with environment-based filtering and multiple output
//! formats (pretty, compact, JSON).
//!
//! # Example
//! ```no_run
//! use biosignal_daq::{config::AcqConfig, tracing_setup};
//! use tracing::info;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AcqConfig::load()?;
//! tracing_setup::init_from_config(&config)?;
//! info!("Application started");
//! # Ok(())
//! # }
//! ```

use crate::config::AcqConfig;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Output format for tracing.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development)
    Pretty,
    /// Compact format without colors (for production)
    Compact,
    /// JSON format for structured logging (for log aggregation)
    Json,
}

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Level,
    /// Output format
    pub format: OutputFormat,
    /// Whether to include file and line numbers
    pub with_file_and_line: bool,
    /// Whether to include thread names
    pub with_thread_names: bool,
    /// Whether to enable ANSI colors (only for Pretty format)
    pub with_ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_file_and_line: false,
            with_thread_names: true,
            with_ansi: true,
        }
    }
}

impl TracingConfig {
    /// Create tracing config with a custom level.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }
}

/// Initialize tracing from the application configuration.
///
/// Reads the log level from the configuration; `RUST_LOG` still takes
/// precedence for per-target filtering.
pub fn init_from_config(config: &AcqConfig) -> Result<(), String> {
    let level = parse_log_level(&config.application.log_level)?;
    init(TracingConfig::new(level))
}

/// Initialize the global tracing subscriber.
///
/// Fails if a global subscriber is already set (e.g. in tests).
pub fn init(config: TracingConfig) -> Result<(), String> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    let base = fmt::layer()
        .with_file(config.with_file_and_line)
        .with_line_number(config.with_file_and_line)
        .with_thread_names(config.with_thread_names);

    match config.format {
        OutputFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(base.pretty().with_ansi(config.with_ansi))
            .try_init(),
        OutputFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(base.compact().with_ansi(config.with_ansi))
            .try_init(),
        OutputFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(base.json())
            .try_init(),
    }
    .map_err(|e| format!("Failed to initialize tracing: {e}"))
}

/// Parse a log level string into a tracing `Level`.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(format!(
            "Invalid log level '{other}'. Must be one of: trace, debug, info, warn, error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(parse_log_level("loud").is_err());
    }
}
