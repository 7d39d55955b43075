//! The per-table state container.
//!
//! A [`ViewStore`] owns one table's slices plus the dataset they apply to.
//! Writes go through named actions ([`ViewStore::dispatch`] and its typed
//! shorthands); reads go through selectors that recompute from
//! `(rows, state, columns)`. Two stores never share state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use super::action::ViewAction;
use super::column::{columns_for, ColumnDef};
use super::error::ViewError;
use super::reducer::{clamp_page_index, reduce, Dataset, ReduceContext};
use super::selectors;
use super::state::{FilterValue, SliceChanges, SortDirection, SortEntry, ViewState};
use crate::config::{RowKeyAccessor, ViewConfig};
use crate::descriptor::SchemaDefinition;
use crate::pagination::{sequence, PageMarker};
use crate::types::{Row, RowKey};

// ---------------------------------------------------------------------------
// Memoized ordering
// ---------------------------------------------------------------------------

/// Inputs that decide which rows are visible and in what order.
#[derive(Debug, Clone, PartialEq)]
struct OrderKey {
    generation: u64,
    global_filter: String,
    column_filters: BTreeMap<String, FilterValue>,
    column_visibility: BTreeMap<String, bool>,
    sorting: Vec<SortEntry>,
}

impl OrderKey {
    fn of(generation: u64, state: &ViewState) -> Self {
        Self {
            generation,
            global_filter: state.global_filter.clone(),
            column_filters: state.column_filters.clone(),
            column_visibility: state.column_visibility.clone(),
            sorting: state.sorting.clone(),
        }
    }

    fn matches(&self, generation: u64, state: &ViewState) -> bool {
        self.generation == generation
            && self.global_filter == state.global_filter
            && self.column_filters == state.column_filters
            && self.column_visibility == state.column_visibility
            && self.sorting == state.sorting
    }
}

/// Filtered and sorted row indices for one [`OrderKey`].
#[derive(Debug)]
struct RowOrder {
    key: OrderKey,
    filtered: Vec<usize>,
    sorted: Vec<usize>,
}

// ---------------------------------------------------------------------------
// ViewStore
// ---------------------------------------------------------------------------

/// State container for one table view.
///
/// Cloning is cheap: columns, config and rows are shared, and the clone
/// carries the current memoized ordering.
#[derive(Debug)]
pub struct ViewStore {
    columns: Arc<[ColumnDef]>,
    config: Arc<ViewConfig>,
    rows: Arc<[Row]>,
    keys: Arc<[RowKey]>,
    key_index: Arc<HashMap<RowKey, usize>>,
    /// Bumped on every dataset replacement.
    generation: u64,
    state: ViewState,
    ordering: Mutex<Option<Arc<RowOrder>>>,
}

impl Clone for ViewStore {
    fn clone(&self) -> Self {
        Self {
            columns: Arc::clone(&self.columns),
            config: Arc::clone(&self.config),
            rows: Arc::clone(&self.rows),
            keys: Arc::clone(&self.keys),
            key_index: Arc::clone(&self.key_index),
            generation: self.generation,
            state: self.state.clone(),
            ordering: Mutex::new(self.ordering.lock().clone()),
        }
    }
}

impl ViewStore {
    /// Creates an empty store with one column per field of `definition`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured initial state references unknown
    /// columns or has a zero page size.
    pub fn new(definition: &SchemaDefinition, config: ViewConfig) -> Result<Self, ViewError> {
        Self::with_columns(columns_for(definition), config)
    }

    /// Creates an empty store over explicit columns.
    ///
    /// # Errors
    ///
    /// See [`ViewStore::new`].
    pub fn with_columns(columns: Vec<ColumnDef>, config: ViewConfig) -> Result<Self, ViewError> {
        check_state(&config.initial_state, &columns)?;
        let mut store = Self {
            columns: columns.into(),
            state: config.initial_state.clone(),
            config: Arc::new(config),
            rows: Arc::from(Vec::new()),
            keys: Arc::from(Vec::new()),
            key_index: Arc::new(HashMap::new()),
            generation: 0,
            ordering: Mutex::new(None),
        };
        store.clamp_page();
        Ok(store)
    }

    /// Builder form of [`ViewStore::set_rows`].
    ///
    /// # Errors
    ///
    /// See [`ViewStore::set_rows`].
    pub fn with_rows(mut self, rows: Vec<Row>) -> Result<Self, ViewError> {
        self.set_rows(rows)?;
        Ok(self)
    }

    /// Replaces the dataset.
    ///
    /// Selected keys absent from the new rows are dropped and the page index
    /// is clamped onto the new page range.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::MissingRowKey`] or [`ViewError::DuplicateRowKey`]
    /// when the row-key accessor cannot give every row a distinct key. The
    /// store is left unchanged on error.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Result<SliceChanges, ViewError> {
        let (keys, key_index) = derive_keys(&rows, &self.config.row_key)?;
        let before = self.state.clone();

        self.rows = rows.into();
        self.keys = keys.into();
        self.key_index = Arc::new(key_index);
        self.generation += 1;

        let index = Arc::clone(&self.key_index);
        let selected = self.state.row_selection.len();
        self.state.row_selection.retain(|key| index.contains_key(key));
        let pruned = selected - self.state.row_selection.len();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped selection for removed rows");
        }
        self.clamp_page();

        tracing::trace!(rows = self.rows.len(), generation = self.generation, "dataset replaced");
        Ok(before.diff(&self.state))
    }

    /// Replaces the state wholesale, e.g. with a snapshot restored from a
    /// preference store.
    ///
    /// # Errors
    ///
    /// Rejects states referencing unknown or disallowed columns and states
    /// with a zero page size. The current state is kept on error.
    pub fn restore(&mut self, mut state: ViewState) -> Result<SliceChanges, ViewError> {
        check_state(&state, &self.columns)?;
        state.row_selection.retain(|key| self.key_index.contains_key(key));
        let before = std::mem::replace(&mut self.state, state);
        self.clamp_page();
        Ok(before.diff(&self.state))
    }

    /// Applies one action.
    ///
    /// # Errors
    ///
    /// Returns the reducer's programmer error; the state is unchanged.
    pub fn dispatch(&mut self, action: &ViewAction) -> Result<SliceChanges, ViewError> {
        let next = {
            let ctx = ReduceContext {
                columns: &self.columns,
                config: &self.config,
                data: &*self,
            };
            reduce(&self.state, action, &ctx)?
        };
        let changes = self.state.diff(&next);
        tracing::trace!(action = action.name(), ?changes, "view action applied");
        self.state = next;
        Ok(changes)
    }

    fn clamp_page(&mut self) {
        let filtered = self.ordering_for(&self.state).filtered.len();
        clamp_page_index(&mut self.state, filtered);
    }

    fn ordering_for(&self, state: &ViewState) -> Arc<RowOrder> {
        let mut slot = self.ordering.lock();
        if let Some(cached) = slot.as_ref().filter(|o| o.key.matches(self.generation, state)) {
            return Arc::clone(cached);
        }
        let filtered = selectors::filtered_indices(&self.rows, state, &self.columns);
        let mut sorted = filtered.clone();
        selectors::sort_indices(&self.rows, &mut sorted, state, &self.columns);
        let fresh = Arc::new(RowOrder {
            key: OrderKey::of(self.generation, state),
            filtered,
            sorted,
        });
        *slot = Some(Arc::clone(&fresh));
        fresh
    }

    fn current_ordering(&self) -> Arc<RowOrder> {
        self.ordering_for(&self.state)
    }

    fn page_range(&self, ordering: &RowOrder) -> std::ops::Range<usize> {
        selectors::page_bounds(ordering.sorted.len(), self.state.pagination)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Never fails; returns `Result` for uniformity with other actions.
    pub fn set_global_filter(&mut self, text: impl Into<String>) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetGlobalFilter { text: text.into() })
    }

    /// # Errors
    ///
    /// Unknown or non-filterable column.
    pub fn set_column_filter(
        &mut self,
        column: impl Into<String>,
        value: FilterValue,
    ) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetColumnFilter {
            column: column.into(),
            value,
        })
    }

    /// # Errors
    ///
    /// Unknown column.
    pub fn clear_column_filter(&mut self, column: impl Into<String>) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ClearColumnFilter { column: column.into() })
    }

    /// # Errors
    ///
    /// Never fails.
    pub fn clear_filters(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ClearFilters)
    }

    /// # Errors
    ///
    /// Unknown or non-sortable column.
    pub fn set_sort(
        &mut self,
        column: impl Into<String>,
        direction: Option<SortDirection>,
    ) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetSort {
            column: column.into(),
            direction,
        })
    }

    /// # Errors
    ///
    /// Unknown or non-sortable column.
    pub fn add_sort(
        &mut self,
        column: impl Into<String>,
        direction: SortDirection,
    ) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::AddSort {
            column: column.into(),
            direction,
        })
    }

    /// # Errors
    ///
    /// Unknown or non-sortable column.
    pub fn toggle_sort(&mut self, column: impl Into<String>) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ToggleSort {
            column: column.into(),
            additive: false,
        })
    }

    /// # Errors
    ///
    /// Unknown or non-sortable column.
    pub fn toggle_sort_additive(&mut self, column: impl Into<String>) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ToggleSort {
            column: column.into(),
            additive: true,
        })
    }

    /// # Errors
    ///
    /// Never fails.
    pub fn clear_sort(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ClearSort)
    }

    /// # Errors
    ///
    /// Only when the current page size is zero.
    pub fn set_page_index(&mut self, index: usize) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetPageIndex { index })
    }

    /// # Errors
    ///
    /// Only when the current page size is zero.
    pub fn next_page(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::NextPage)
    }

    /// # Errors
    ///
    /// Only when the current page size is zero.
    pub fn previous_page(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::PreviousPage)
    }

    /// # Errors
    ///
    /// Only when the current page size is zero.
    pub fn first_page(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::FirstPage)
    }

    /// # Errors
    ///
    /// Only when the current page size is zero.
    pub fn last_page(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::LastPage)
    }

    /// # Errors
    ///
    /// [`ViewError::InvalidPageSize`] for `size == 0`.
    pub fn set_page_size(&mut self, size: usize) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetPageSize { size })
    }

    /// # Errors
    ///
    /// [`ViewError::UnknownRow`] when no row has `key`.
    pub fn toggle_row_selection(&mut self, key: impl Into<RowKey>) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ToggleRowSelection { key: key.into() })
    }

    /// # Errors
    ///
    /// Never fails.
    pub fn select_all_on_page(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SelectAllOnPage)
    }

    /// # Errors
    ///
    /// Never fails.
    pub fn clear_selection(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::ClearSelection)
    }

    /// # Errors
    ///
    /// Unknown column.
    pub fn set_column_visibility(
        &mut self,
        column: impl Into<String>,
        visible: bool,
    ) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::SetColumnVisibility {
            column: column.into(),
            visible,
        })
    }

    /// # Errors
    ///
    /// Never fails for a store built through [`ViewStore::new`].
    pub fn reset(&mut self) -> Result<SliceChanges, ViewError> {
        self.dispatch(&ViewAction::Reset)
    }

    // -----------------------------------------------------------------------
    // Selectors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Owned copy of the current slices.
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.state.clone()
    }

    /// The current slices as plain JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.state)
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The full dataset in its original order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn row_key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn row_by_key(&self, key: &str) -> Option<&Row> {
        self.key_index.get(key).map(|&i| &self.rows[i])
    }

    /// Rows passing the global and column filters, in dataset order.
    #[must_use]
    pub fn filtered_rows(&self) -> Vec<&Row> {
        self.current_ordering()
            .filtered
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Number of rows passing the filters.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.current_ordering().filtered.len()
    }

    /// Filtered rows in sort order.
    #[must_use]
    pub fn sorted_rows(&self) -> Vec<&Row> {
        self.current_ordering()
            .sorted
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Rows on the current page.
    #[must_use]
    pub fn page_rows(&self) -> Vec<&Row> {
        let ordering = self.current_ordering();
        ordering.sorted[self.page_range(&ordering)]
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Keys of the rows on the current page, in display order.
    #[must_use]
    pub fn page_row_keys(&self) -> Vec<RowKey> {
        let ordering = self.current_ordering();
        ordering.sorted[self.page_range(&ordering)]
            .iter()
            .map(|&i| self.keys[i].clone())
            .collect()
    }

    /// Never less than 1.
    #[must_use]
    pub fn page_count(&self) -> usize {
        selectors::page_count(self.row_count(), self.state.pagination.page_size)
    }

    #[must_use]
    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index > 0
    }

    #[must_use]
    pub fn can_next_page(&self) -> bool {
        self.state.pagination.page_index.saturating_add(1) < self.page_count()
    }

    /// Columns not hidden by the visibility slice, in declaration order.
    #[must_use]
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns
            .iter()
            .filter(|c| self.state.is_column_visible(&c.id))
            .collect()
    }

    /// Selected rows in dataset order, regardless of filters.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.rows
            .iter()
            .zip(self.keys.iter())
            .filter(|(_, key)| self.state.row_selection.contains(*key))
            .map(|(row, _)| row)
            .collect()
    }

    /// True when the page has rows and every one is selected.
    #[must_use]
    pub fn is_all_page_rows_selected(&self) -> bool {
        let keys = self.page_row_keys();
        !keys.is_empty() && keys.iter().all(|k| self.state.row_selection.contains(k))
    }

    /// True when some, but not all, rows on the page are selected.
    #[must_use]
    pub fn is_some_page_rows_selected(&self) -> bool {
        let keys = self.page_row_keys();
        let selected = keys
            .iter()
            .filter(|k| self.state.row_selection.contains(*k))
            .count();
        selected > 0 && selected < keys.len()
    }

    /// Page strip for the pager, with the current page 1-based.
    #[must_use]
    pub fn page_strip(&self, max_visible: usize) -> Vec<PageMarker> {
        sequence(
            self.state.pagination.page_index.saturating_add(1),
            self.page_count(),
            max_visible,
        )
    }
}

impl Dataset for ViewStore {
    fn contains_key(&self, key: &str) -> bool {
        self.key_index.contains_key(key)
    }

    fn filtered_len(&self, state: &ViewState) -> usize {
        self.ordering_for(state).filtered.len()
    }

    fn page_keys(&self, state: &ViewState) -> Vec<RowKey> {
        let ordering = self.ordering_for(state);
        let range = selectors::page_bounds(ordering.sorted.len(), state.pagination);
        ordering.sorted[range]
            .iter()
            .map(|&i| self.keys[i].clone())
            .collect()
    }
}

fn derive_keys(
    rows: &[Row],
    accessor: &RowKeyAccessor,
) -> Result<(Vec<RowKey>, HashMap<RowKey, usize>), ViewError> {
    let mut keys = Vec::with_capacity(rows.len());
    let mut index = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let key = accessor.key_for(row, i).ok_or_else(|| ViewError::MissingRowKey {
            index: i,
            field: match accessor {
                RowKeyAccessor::Field { name } => name.clone(),
                _ => String::new(),
            },
        })?;
        if index.insert(key.clone(), i).is_some() {
            return Err(ViewError::DuplicateRowKey { key, index: i });
        }
        keys.push(key);
    }
    Ok((keys, index))
}

/// Rejects states a reducer could never have produced for these columns.
fn check_state(state: &ViewState, columns: &[ColumnDef]) -> Result<(), ViewError> {
    let find = |id: &str| {
        columns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ViewError::UnknownColumn { column: id.to_string() })
    };
    if state.pagination.page_size == 0 {
        return Err(ViewError::InvalidPageSize);
    }
    for entry in &state.sorting {
        if !find(&entry.column_name)?.sortable {
            return Err(ViewError::ColumnNotSortable {
                column: entry.column_name.clone(),
            });
        }
    }
    for id in state.column_filters.keys() {
        let column = find(id)?;
        if !column.filterable {
            return Err(ViewError::ColumnNotFilterable {
                column: id.clone(),
                field_type: column.field_type,
            });
        }
    }
    for id in state.column_visibility.keys() {
        find(id)?;
    }
    Ok(())
}
