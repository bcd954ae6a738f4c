//! Telemetry configuration from environment variables.

use std::env;

/// Default log filter when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for the logging stack.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to colorize console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "chain-bootstrap".to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BOOTSTRAP_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `BOOTSTRAP_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `NO_COLOR`: Disable ANSI colors when set
    pub fn from_env() -> Self {
        Self {
            service_name: "chain-bootstrap".to_string(),

            log_level: env::var("BOOTSTRAP_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),

            json_logs: env::var("BOOTSTRAP_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            ansi: env::var("NO_COLOR").is_err(),
        }
    }

    /// Force debug-level output (the CLI `--debug` flag).
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.log_level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chain-bootstrap");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_with_debug_overrides_level() {
        let config = TelemetryConfig::default().with_debug(true);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_with_debug_false_keeps_level() {
        let mut config = TelemetryConfig::default();
        config.log_level = "warn".to_string();
        let config = config.with_debug(false);
        assert_eq!(config.log_level, "warn");
    }
}
