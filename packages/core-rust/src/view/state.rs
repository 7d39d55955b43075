//! View state slices.
//!
//! Every slice is plain serializable data so a snapshot can be handed to a
//! preference store as JSON and fed back as the initial state of a later
//! mount. Keys use camelCase (`pageIndex`, `columnFilters`, ...).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RowKey, Value};

/// Page size used when neither the config nor a restored state provides one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sort direction for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One entry of the sort list. The first entry is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortEntry {
    pub column_name: String,
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_name: column.into(),
            direction,
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Filter applied to one column.
///
/// How a [`FilterValue::Value`] matches depends on the column's field type:
/// exact for enum and boolean columns (an array value matches any of its
/// items), case-insensitive substring for string, array and object columns,
/// numeric equality for number columns and same-day for date columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterValue {
    Value { value: Value },
    /// Inclusive numeric bounds; either side may be open.
    Range {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        max: Option<f64>,
    },
    /// Inclusive chronological bounds; either side may be open.
    DateRange {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        from: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        to: Option<DateTime<Utc>>,
    },
}

impl FilterValue {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range { min, max }
    }

    #[must_use]
    pub fn date_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self::DateRange { from, to }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Pagination cursor. `page_index` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// All slices governing one table view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    /// Empty means natural dataset order.
    pub sorting: Vec<SortEntry>,
    pub column_filters: BTreeMap<String, FilterValue>,
    pub global_filter: String,
    pub pagination: PaginationState,
    pub row_selection: BTreeSet<RowKey>,
    /// Columns absent from the map are visible.
    pub column_visibility: BTreeMap<String, bool>,
}

impl ViewState {
    #[must_use]
    pub fn is_column_visible(&self, column: &str) -> bool {
        self.column_visibility.get(column).copied().unwrap_or(true)
    }

    /// Direction of the sort on `column`, if it is sorted.
    #[must_use]
    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        self.sorting
            .iter()
            .find(|entry| entry.column_name == column)
            .map(|entry| entry.direction)
    }

    /// Which slices differ between `self` and `next`.
    #[must_use]
    pub fn diff(&self, next: &Self) -> SliceChanges {
        SliceChanges {
            sorting: self.sorting != next.sorting,
            filters: self.global_filter != next.global_filter
                || self.column_filters != next.column_filters,
            pagination: self.pagination != next.pagination,
            selection: self.row_selection != next.row_selection,
            visibility: self.column_visibility != next.column_visibility,
        }
    }
}

/// Which slices a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceChanges {
    pub sorting: bool,
    pub filters: bool,
    pub pagination: bool,
    pub selection: bool,
    pub visibility: bool,
}

impl SliceChanges {
    #[must_use]
    pub fn any(&self) -> bool {
        self.sorting || self.filters || self.pagination || self.selection || self.visibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_first_page_of_ten() {
        let state = ViewState::default();
        assert_eq!(state.pagination, PaginationState { page_index: 0, page_size: 10 });
        assert!(state.sorting.is_empty());
        assert!(state.is_column_visible("anything"));
    }

    #[test]
    fn snapshot_is_camel_case_json() {
        let mut state = ViewState::default();
        state.sorting.push(SortEntry::new("amount", SortDirection::Desc));
        state
            .column_filters
            .insert("status".into(), FilterValue::equals("approved"));
        state.column_filters.insert("amount".into(), FilterValue::range(Some(10.0), None));
        state.row_selection.insert("r1".into());
        state.column_visibility.insert("notes".into(), false);

        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["sorting"][0]["columnName"], "amount");
        assert_eq!(json["sorting"][0]["direction"], "desc");
        assert_eq!(json["columnFilters"]["status"]["kind"], "value");
        assert_eq!(json["columnFilters"]["status"]["value"], "approved");
        assert_eq!(json["columnFilters"]["amount"], serde_json::json!({"kind": "range", "min": 10.0}));
        assert_eq!(json["pagination"]["pageSize"], 10);
        assert_eq!(json["rowSelection"], serde_json::json!(["r1"]));
        assert_eq!(json["columnVisibility"]["notes"], false);

        let back: ViewState = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, state);
    }

    #[test]
    fn partial_snapshot_fills_defaults() {
        let state: ViewState =
            serde_json::from_str(r#"{"pagination":{"pageIndex":0,"pageSize":25}}"#).expect("parse");
        assert_eq!(state.pagination.page_size, 25);
        assert!(state.column_filters.is_empty());
    }

    #[test]
    fn diff_reports_touched_slices() {
        let before = ViewState::default();
        let mut after = before.clone();
        after.global_filter = "x".into();
        after.pagination.page_index = 0;
        let changes = before.diff(&after);
        assert!(changes.filters);
        assert!(!changes.pagination);
        assert!(changes.any());
        assert!(!before.diff(&before).any());
    }
}
