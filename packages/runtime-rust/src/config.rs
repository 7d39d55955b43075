//! Runtime configuration.

use serde::{Deserialize, Serialize};

use schemaview_core::pagination::DEFAULT_MAX_VISIBLE;
use schemaview_core::view::DEFAULT_PAGE_SIZE;
use schemaview_core::ViewConfig;

use crate::error::RuntimeError;
use crate::telemetry::LogFormat;

/// Settings shared by every view mounted on a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Page size of views mounted through [`RuntimeConfig::view_config`].
    pub default_page_size: usize,
    /// Width of the page strip returned by `ViewHandle::page_strip`.
    pub max_visible_pages: usize,
    pub enable_multi_sort: bool,
    /// Seed views from the preference store on mount and save on unmount.
    pub persist_preferences: bool,
    pub log_format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_visible_pages: DEFAULT_MAX_VISIBLE,
            enable_multi_sort: false,
            persist_preferences: true,
            log_format: LogFormat::Pretty,
            log_filter: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Parses a JSON config; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Config`] for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, RuntimeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// A view config carrying this runtime's defaults.
    #[must_use]
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig::default()
            .with_page_size(self.default_page_size)
            .with_multi_sort(self.enable_multi_sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_visible_pages, 5);
        assert!(config.persist_preferences);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            RuntimeConfig::from_json(r#"{"defaultPageSize": 25, "logFormat": "json"}"#).expect("parse");
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_visible_pages, 5);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = RuntimeConfig::from_json("{").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn view_config_inherits_defaults() {
        let config = RuntimeConfig {
            default_page_size: 50,
            enable_multi_sort: true,
            ..RuntimeConfig::default()
        };
        let view = config.view_config();
        assert_eq!(view.initial_state.pagination.page_size, 50);
        assert!(view.enable_multi_sort);
    }
}
