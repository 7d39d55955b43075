//! Actions accepted by the view reducer.

use serde::{Deserialize, Serialize};

use super::state::{FilterValue, SortDirection};
use crate::types::RowKey;

/// A named mutation of view state.
///
/// Actions are plain data so they can be queued, logged and replayed. The
/// wire form is internally tagged: `{"type": "setPageIndex", "index": 2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewAction {
    SetGlobalFilter {
        text: String,
    },
    SetColumnFilter {
        column: String,
        value: FilterValue,
    },
    ClearColumnFilter {
        column: String,
    },
    /// Clears the global filter and every column filter.
    ClearFilters,
    /// `None` clears the column's sort. Replaces other sorts.
    SetSort {
        column: String,
        direction: Option<SortDirection>,
    },
    /// Adds or updates one sort key while keeping the others.
    AddSort {
        column: String,
        direction: SortDirection,
    },
    /// Cycles `unsorted -> asc -> desc -> unsorted`.
    ToggleSort {
        column: String,
        #[serde(default)]
        additive: bool,
    },
    ClearSort,
    SetPageIndex {
        index: usize,
    },
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    SetPageSize {
        size: usize,
    },
    ToggleRowSelection {
        key: RowKey,
    },
    SelectAllOnPage,
    ClearSelection,
    SetColumnVisibility {
        column: String,
        visible: bool,
    },
    Reset,
}

impl ViewAction {
    /// Stable action name, used as a span field and in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetGlobalFilter { .. } => "setGlobalFilter",
            Self::SetColumnFilter { .. } => "setColumnFilter",
            Self::ClearColumnFilter { .. } => "clearColumnFilter",
            Self::ClearFilters => "clearFilters",
            Self::SetSort { .. } => "setSort",
            Self::AddSort { .. } => "addSort",
            Self::ToggleSort { .. } => "toggleSort",
            Self::ClearSort => "clearSort",
            Self::SetPageIndex { .. } => "setPageIndex",
            Self::NextPage => "nextPage",
            Self::PreviousPage => "previousPage",
            Self::FirstPage => "firstPage",
            Self::LastPage => "lastPage",
            Self::SetPageSize { .. } => "setPageSize",
            Self::ToggleRowSelection { .. } => "toggleRowSelection",
            Self::SelectAllOnPage => "selectAllOnPage",
            Self::ClearSelection => "clearSelection",
            Self::SetColumnVisibility { .. } => "setColumnVisibility",
            Self::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_internally_tagged() {
        let action = ViewAction::SetPageIndex { index: 2 };
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "setPageIndex", "index": 2}));
        assert_eq!(json["type"], action.name());
    }

    #[test]
    fn toggle_sort_defaults_to_single() {
        let action: ViewAction =
            serde_json::from_str(r#"{"type":"toggleSort","column":"amount"}"#).expect("parse");
        assert_eq!(
            action,
            ViewAction::ToggleSort {
                column: "amount".into(),
                additive: false
            }
        );
    }

    #[test]
    fn column_filter_carries_filter_value() {
        let action: ViewAction = serde_json::from_str(
            r#"{"type":"setColumnFilter","column":"status","value":{"kind":"value","value":"approved"}}"#,
        )
        .expect("parse");
        assert_eq!(action.name(), "setColumnFilter");
        assert!(matches!(
            action,
            ViewAction::SetColumnFilter { value: FilterValue::Value { .. }, .. }
        ));
    }
}
