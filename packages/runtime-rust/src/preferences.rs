//! Per-view preference persistence.
//!
//! [`ViewPreferences`] is the slice of a view state that survives an
//! unmount: column visibility, page size, sorting and column filters. The
//! registry captures it on unmount and applies it to the initial state on
//! the next mount of the same view id. Where it is kept is up to the
//! [`PreferenceStore`] implementation.

use std::collections::BTreeMap;

use anyhow::Context;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use schemaview_core::{ColumnDef, FilterValue, SortEntry, ViewState};

/// Saved preference slices of one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewPreferences {
    pub column_visibility: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    pub sorting: Vec<SortEntry>,
    pub column_filters: BTreeMap<String, FilterValue>,
}

impl ViewPreferences {
    #[must_use]
    pub fn capture(state: &ViewState) -> Self {
        Self {
            column_visibility: state.column_visibility.clone(),
            page_size: Some(state.pagination.page_size),
            sorting: state.sorting.clone(),
            column_filters: state.column_filters.clone(),
        }
    }

    /// Overlays the saved slices onto `state`.
    ///
    /// Entries naming columns that no longer exist, or that can no longer
    /// sort or filter, are skipped, as is a zero page size. Returns the
    /// number of skipped entries.
    pub fn apply_to(&self, state: &mut ViewState, columns: &[ColumnDef]) -> usize {
        let find = |id: &str| columns.iter().find(|c| c.id == id);
        let mut skipped = 0;

        for (id, visible) in &self.column_visibility {
            if find(id).is_some() {
                state.column_visibility.insert(id.clone(), *visible);
            } else {
                skipped += 1;
            }
        }

        match self.page_size {
            Some(0) => skipped += 1,
            Some(size) => state.pagination.page_size = size,
            None => {}
        }

        if !self.sorting.is_empty() {
            let before = self.sorting.len();
            state.sorting = self
                .sorting
                .iter()
                .filter(|entry| find(&entry.column_name).is_some_and(|c| c.sortable))
                .cloned()
                .collect();
            skipped += before - state.sorting.len();
        }

        for (id, filter) in &self.column_filters {
            if find(id).is_some_and(|c| c.filterable) {
                state.column_filters.insert(id.clone(), filter.clone());
            } else {
                skipped += 1;
            }
        }

        state.pagination.page_index = 0;
        skipped
    }
}

/// Backing store for view preferences, keyed by view id.
///
/// Used as `Arc<dyn PreferenceStore>`.
pub trait PreferenceStore: Send + Sync {
    /// Returns `None` if nothing was saved for `view`.
    fn load(&self, view: &str) -> anyhow::Result<Option<ViewPreferences>>;

    fn save(&self, view: &str, preferences: &ViewPreferences) -> anyhow::Result<()>;

    fn remove(&self, view: &str) -> anyhow::Result<()>;
}

/// In-process store holding preferences as JSON documents.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    documents: DashMap<String, String>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored JSON document for `view`, as written by [`PreferenceStore::save`].
    #[must_use]
    pub fn document(&self, view: &str) -> Option<String> {
        self.documents.get(view).map(|doc| doc.value().clone())
    }

    /// Replaces the stored document for `view` without validating it.
    pub fn insert_document(&self, view: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(view.into(), document.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, view: &str) -> anyhow::Result<Option<ViewPreferences>> {
        let Some(doc) = self.documents.get(view) else {
            return Ok(None);
        };
        let preferences = serde_json::from_str(doc.value())
            .with_context(|| format!("corrupt preferences for view '{view}'"))?;
        Ok(Some(preferences))
    }

    fn save(&self, view: &str, preferences: &ViewPreferences) -> anyhow::Result<()> {
        let doc = serde_json::to_string(preferences)
            .with_context(|| format!("serializing preferences for view '{view}'"))?;
        self.documents.insert(view.to_string(), doc);
        Ok(())
    }

    fn remove(&self, view: &str) -> anyhow::Result<()> {
        self.documents.remove(view);
        Ok(())
    }
}

/// Store that keeps nothing. Every load returns `None`.
pub struct NullPreferenceStore;

impl PreferenceStore for NullPreferenceStore {
    fn load(&self, _view: &str) -> anyhow::Result<Option<ViewPreferences>> {
        Ok(None)
    }

    fn save(&self, _view: &str, _preferences: &ViewPreferences) -> anyhow::Result<()> {
        Ok(())
    }

    fn remove(&self, _view: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
