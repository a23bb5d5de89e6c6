//! Structured logging setup.
//!
//! Libraries emit `tracing` events; the host application decides where they
//! go. [`init_logging`] is the batteries-included initializer for binaries
//! and integration harnesses that do not bring their own subscriber.
//!
//! Secret payload contents are never logged anywhere in this crate; log
//! fields carry identifiers (secret id, region, host, user) only.

use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{Error, Result};

/// Log verbosity, e.g. `info` or `keyplane=debug`.
const LOG_LEVEL_VAR: &str = "KEYPLANE_LOG_LEVEL";

/// Set to `json` for machine-readable output.
const LOG_FORMAT_VAR: &str = "KEYPLANE_LOG_FORMAT";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directive passed to `tracing_subscriber::EnvFilter`.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json: false }
    }
}

impl TelemetryConfig {
    /// Load from `KEYPLANE_LOG_LEVEL` and `KEYPLANE_LOG_FORMAT`.
    pub fn from_env() -> Self {
        let log_level = std::env::var(LOG_LEVEL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let json = std::env::var(LOG_FORMAT_VAR)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self { log_level, json }
    }
}

/// Install the global tracing subscriber.
///
/// Errors if the filter directive is invalid or a subscriber is already
/// installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| Error::config(format!("invalid log filter '{}': {e}", config.log_level)))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| Error::config(format!("failed to install tracing subscriber: {e}")))
}
