//! Logging setup using tracing.
//!
//! This module provides consistent logging configuration across starlight.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, util::TryInitError, EnvFilter};

/// Crates whose events are shown at the configured level.
const TARGETS: &[&str] = &[
    "starlight",
    "starlight_mcp",
    "starlight_tools",
    "starlight_util",
    "tower_http",
];

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level for the starlight crates and HTTP tracing.
    pub level: LogLevel,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
    /// Whether to emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Build the filter directive string for this configuration.
    pub fn directives(&self) -> String {
        TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize logging with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
/// This should be called once at application startup.
pub fn init(config: LogConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    let fmt_layer = tracing_fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(config.ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}
