//! View store configuration.
//!
//! A [`ViewConfig`] is what `reset` returns to: the initial slices the store
//! was created with, not a blank state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Row, RowKey};
use crate::view::state::{FilterValue, SortDirection, SortEntry, ViewState};

/// Custom row-key function: `(row, index) -> key`.
pub type RowKeyFn = Arc<dyn Fn(&Row, usize) -> RowKey + Send + Sync>;

/// How the store derives a stable key for each dataset row.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowKeyAccessor {
    /// The row's position in the dataset, as a decimal string.
    #[default]
    Index,
    /// The text of one field. Rows without that field are rejected.
    Field { name: String },
    /// Arbitrary function. Not serializable.
    #[serde(skip)]
    Custom(RowKeyFn),
}

impl RowKeyAccessor {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field { name: name.into() }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Row, usize) -> RowKey + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Key for `row` at `index`; `None` when a keyed field is missing or null.
    #[must_use]
    pub fn key_for(&self, row: &Row, index: usize) -> Option<RowKey> {
        match self {
            Self::Index => Some(index.to_string()),
            Self::Field { name } => row
                .get(name)
                .filter(|v| !v.is_null())
                .map(crate::types::Value::display_text),
            Self::Custom(f) => Some(f(row, index)),
        }
    }
}

impl fmt::Debug for RowKeyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => f.write_str("Index"),
            Self::Field { name } => f.debug_struct("Field").field("name", name).finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// Configuration for one view store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// Slices the store starts from and `reset` returns to.
    pub initial_state: ViewState,
    /// Allow additive sort requests. When false they replace the sort list.
    pub enable_multi_sort: bool,
    pub row_key: RowKeyAccessor,
}

impl ViewConfig {
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.initial_state.pagination.page_size = size;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.initial_state.sorting.push(SortEntry::new(column, direction));
        self
    }

    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: FilterValue) -> Self {
        self.initial_state.column_filters.insert(column.into(), value);
        self
    }

    #[must_use]
    pub fn with_hidden_column(mut self, column: impl Into<String>) -> Self {
        self.initial_state.column_visibility.insert(column.into(), false);
        self
    }

    #[must_use]
    pub fn with_multi_sort(mut self, enabled: bool) -> Self {
        self.enable_multi_sort = enabled;
        self
    }

    #[must_use]
    pub fn with_row_key(mut self, accessor: RowKeyAccessor) -> Self {
        self.row_key = accessor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{row, Value};

    #[test]
    fn default_config_keys_by_index() {
        let config = ViewConfig::default();
        assert_eq!(config.initial_state.pagination.page_size, 10);
        assert!(!config.enable_multi_sort);
        assert_eq!(config.row_key.key_for(&Row::new(), 7).as_deref(), Some("7"));
    }

    #[test]
    fn field_accessor_reads_cell_text() {
        let accessor = RowKeyAccessor::field("id");
        let r = row([("id", Value::from(42i64))]);
        assert_eq!(accessor.key_for(&r, 0).as_deref(), Some("42"));
        assert_eq!(accessor.key_for(&row([("id", Value::Null)]), 0), None);
        assert_eq!(accessor.key_for(&Row::new(), 0), None);
    }

    #[test]
    fn custom_accessor_is_called_with_index() {
        let accessor = RowKeyAccessor::custom(|_, i| format!("row-{i}"));
        assert_eq!(accessor.key_for(&Row::new(), 3).as_deref(), Some("row-3"));
        assert_eq!(format!("{accessor:?}"), "Custom(<fn>)");
    }

    #[test]
    fn loads_from_json() {
        let config: ViewConfig = serde_json::from_str(
            r#"{
                "initialState": {
                    "pagination": {"pageIndex": 0, "pageSize": 25},
                    "sorting": [{"columnName": "amount", "direction": "desc"}]
                },
                "enableMultiSort": true,
                "rowKey": {"kind": "field", "name": "id"}
            }"#,
        )
        .expect("parse");
        assert_eq!(config.initial_state.pagination.page_size, 25);
        assert_eq!(config.initial_state.sort_direction("amount"), Some(SortDirection::Desc));
        assert!(config.enable_multi_sort);
        assert!(matches!(config.row_key, RowKeyAccessor::Field { ref name } if name == "id"));
    }

    #[test]
    fn builders_compose() {
        let config = ViewConfig::default()
            .with_page_size(5)
            .with_sort("name", SortDirection::Asc)
            .with_filter("status", FilterValue::equals("draft"))
            .with_hidden_column("notes");
        let state = &config.initial_state;
        assert_eq!(state.pagination.page_size, 5);
        assert_eq!(state.sorting.len(), 1);
        assert!(state.column_filters.contains_key("status"));
        assert!(!state.is_column_visible("notes"));
    }
}
