//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::RuntimeError;

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
///
/// # Errors
///
/// Returns [`RuntimeError::Telemetry`] if a global subscriber is already set.
pub fn init_tracing(format: LogFormat, default_filter: &str) -> Result<(), RuntimeError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| RuntimeError::Telemetry {
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error() {
        let _ = init_tracing(LogFormat::Json, "debug");
        let second = init_tracing(LogFormat::Pretty, "debug");
        assert!(matches!(second, Err(RuntimeError::Telemetry { .. })));
    }

    #[test]
    fn format_names() {
        assert_eq!(serde_json::to_value(LogFormat::Json).expect("serialize"), "json");
        let parsed: LogFormat = serde_json::from_str("\"pretty\"").expect("parse");
        assert_eq!(parsed, LogFormat::Pretty);
    }
}
