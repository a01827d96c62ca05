//! Tracing subscriber setup for binaries
//!
//! Libraries only emit events; a binary calls [`init_tracing`] once.

use crate::config::LogFormat;
use crate::error::{Result, SdkError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global subscriber
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_tracing(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| SdkError::Telemetry(format!("Invalid log filter '{}': {}", default_level, e)))?;

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .map_err(|e| SdkError::Telemetry(format!("Failed to initialize tracing: {}", e)))
}
