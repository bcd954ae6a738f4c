//! # Bootstrap Telemetry
//!
//! Logging setup shared by the `chain-bootstrap` binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bootstrap_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env().with_debug(true);
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BOOTSTRAP_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `BOOTSTRAP_JSON_LOGS` | `false` | JSON formatted output |
//! | `NO_COLOR` | unset | Disable ANSI colors |

#![warn(missing_docs)]

mod config;
mod tracing_setup;

pub use config::{TelemetryConfig, DEFAULT_LOG_LEVEL};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed or could not be set.
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global tracing subscriber described by `config`.
///
/// Call once, early in `main`. A second call fails with
/// [`TelemetryError::SubscriberInit`].
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_setup::init_tracing(config)
}

/// Open an `info` span for a pipeline stage.
///
/// # Example
///
/// ```rust,ignore
/// use bootstrap_telemetry::stage_span;
///
/// let _span = stage_span!("merge_app_config", validators = 3).entered();
/// ```
#[macro_export]
macro_rules! stage_span {
    ($name:expr) => {
        tracing::info_span!("stage", stage = $name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!("stage", stage = $name, $($field)*)
    };
}
