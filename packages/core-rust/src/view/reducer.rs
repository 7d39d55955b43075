//! Pure state transitions: `(state, action) -> state`.
//!
//! The reducer never touches rows directly. It asks a [`Dataset`] for the
//! few facts it needs (row keys, filtered length, keys on a page) so it can
//! be driven by the store or by a test double.

use super::action::ViewAction;
use super::column::ColumnDef;
use super::error::ViewError;
use super::selectors::page_count;
use super::state::{SortDirection, SortEntry, ViewState};
use crate::config::ViewConfig;
use crate::types::RowKey;

/// Read-only facts about the dataset a reducer may consult.
pub trait Dataset {
    fn contains_key(&self, key: &str) -> bool;

    /// Number of rows passing `state`'s filters.
    fn filtered_len(&self, state: &ViewState) -> usize;

    /// Keys of the rows on `state`'s current page, in display order.
    fn page_keys(&self, state: &ViewState) -> Vec<RowKey>;
}

/// Everything a transition may read besides the previous state.
pub struct ReduceContext<'a> {
    pub columns: &'a [ColumnDef],
    pub config: &'a ViewConfig,
    pub data: &'a dyn Dataset,
}

impl ReduceContext<'_> {
    fn column(&self, id: &str) -> Result<&ColumnDef, ViewError> {
        self.columns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ViewError::UnknownColumn { column: id.to_string() })
    }

    fn sortable(&self, id: &str) -> Result<(), ViewError> {
        if self.column(id)?.sortable {
            Ok(())
        } else {
            Err(ViewError::ColumnNotSortable { column: id.to_string() })
        }
    }

    fn filterable(&self, id: &str) -> Result<(), ViewError> {
        let column = self.column(id)?;
        if column.filterable {
            Ok(())
        } else {
            Err(ViewError::ColumnNotFilterable {
                column: id.to_string(),
                field_type: column.field_type,
            })
        }
    }
}

/// Applies `action` to `state`, returning the next state.
///
/// Filter and page-size changes reset `page_index` to 0. Every result has
/// its page index clamped into the page range of the rows it filters.
///
/// # Errors
///
/// Programmer errors only: unknown columns, sorting or filtering a column
/// that does not allow it, unknown row keys, and a zero page size.
pub fn reduce(
    state: &ViewState,
    action: &ViewAction,
    ctx: &ReduceContext<'_>,
) -> Result<ViewState, ViewError> {
    let mut next = state.clone();
    match action {
        ViewAction::SetGlobalFilter { text } => {
            next.global_filter.clone_from(text);
            next.pagination.page_index = 0;
        }
        ViewAction::SetColumnFilter { column, value } => {
            ctx.filterable(column)?;
            next.column_filters.insert(column.clone(), value.clone());
            next.pagination.page_index = 0;
        }
        ViewAction::ClearColumnFilter { column } => {
            ctx.column(column)?;
            next.column_filters.remove(column);
            next.pagination.page_index = 0;
        }
        ViewAction::ClearFilters => {
            next.global_filter.clear();
            next.column_filters.clear();
            next.pagination.page_index = 0;
        }
        ViewAction::SetSort { column, direction } => {
            ctx.sortable(column)?;
            apply_sort(&mut next.sorting, column, *direction, false);
        }
        ViewAction::AddSort { column, direction } => {
            ctx.sortable(column)?;
            apply_sort(
                &mut next.sorting,
                column,
                Some(*direction),
                ctx.config.enable_multi_sort,
            );
        }
        ViewAction::ToggleSort { column, additive } => {
            ctx.sortable(column)?;
            let direction = match state.sort_direction(column) {
                None => Some(SortDirection::Asc),
                Some(SortDirection::Asc) => Some(SortDirection::Desc),
                Some(SortDirection::Desc) => None,
            };
            apply_sort(
                &mut next.sorting,
                column,
                direction,
                *additive && ctx.config.enable_multi_sort,
            );
        }
        ViewAction::ClearSort => next.sorting.clear(),
        ViewAction::SetPageIndex { index } => next.pagination.page_index = *index,
        ViewAction::NextPage => {
            next.pagination.page_index = next.pagination.page_index.saturating_add(1);
        }
        ViewAction::PreviousPage => {
            next.pagination.page_index = next.pagination.page_index.saturating_sub(1);
        }
        ViewAction::FirstPage => next.pagination.page_index = 0,
        ViewAction::LastPage => next.pagination.page_index = usize::MAX,
        ViewAction::SetPageSize { size } => {
            if *size == 0 {
                return Err(ViewError::InvalidPageSize);
            }
            next.pagination.page_size = *size;
            next.pagination.page_index = 0;
        }
        ViewAction::ToggleRowSelection { key } => {
            if !ctx.data.contains_key(key) {
                return Err(ViewError::UnknownRow { key: key.clone() });
            }
            if !next.row_selection.remove(key) {
                next.row_selection.insert(key.clone());
            }
        }
        ViewAction::SelectAllOnPage => {
            next.row_selection.extend(ctx.data.page_keys(state));
        }
        ViewAction::ClearSelection => next.row_selection.clear(),
        ViewAction::SetColumnVisibility { column, visible } => {
            ctx.column(column)?;
            next.column_visibility.insert(column.clone(), *visible);
        }
        ViewAction::Reset => {
            next = ctx.config.initial_state.clone();
            next.row_selection.retain(|key| ctx.data.contains_key(key));
        }
    }

    if next.pagination.page_size == 0 {
        return Err(ViewError::InvalidPageSize);
    }
    if next.pagination.page_index > 0 {
        let filtered = ctx.data.filtered_len(&next);
        clamp_page_index(&mut next, filtered);
    }
    Ok(next)
}

/// Pulls `page_index` back onto the last page. Returns whether it moved.
pub(crate) fn clamp_page_index(state: &mut ViewState, filtered_len: usize) -> bool {
    let last = page_count(filtered_len, state.pagination.page_size) - 1;
    if state.pagination.page_index > last {
        tracing::trace!(
            requested = state.pagination.page_index,
            clamped = last,
            "page index clamped"
        );
        state.pagination.page_index = last;
        true
    } else {
        false
    }
}

/// `None` removes the column's entry. Non-additive requests replace the list.
fn apply_sort(
    sorting: &mut Vec<SortEntry>,
    column: &str,
    direction: Option<SortDirection>,
    additive: bool,
) {
    match (direction, additive) {
        (None, _) => sorting.retain(|entry| entry.column_name != column),
        (Some(direction), false) => *sorting = vec![SortEntry::new(column, direction)],
        (Some(direction), true) => {
            if let Some(entry) = sorting.iter_mut().find(|e| e.column_name == column) {
                entry.direction = direction;
            } else {
                sorting.push(SortEntry::new(column, direction));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::descriptor::FieldType;
    use crate::view::state::{FilterValue, PaginationState};

    /// Fixed-size dataset: keys `r0..rN`, filters ignored unless the global
    /// filter is `"none"`.
    struct Fixed {
        len: usize,
    }

    impl Dataset for Fixed {
        fn contains_key(&self, key: &str) -> bool {
            key.strip_prefix('r')
                .and_then(|n| n.parse::<usize>().ok())
                .is_some_and(|n| n < self.len)
        }

        fn filtered_len(&self, state: &ViewState) -> usize {
            if state.global_filter == "none" {
                0
            } else {
                self.len
            }
        }

        fn page_keys(&self, state: &ViewState) -> Vec<RowKey> {
            let size = state.pagination.page_size;
            let start = state.pagination.page_index * size;
            (start..(start + size).min(self.filtered_len(state)))
                .map(|i| format!("r{i}"))
                .collect()
        }
    }

    fn columns() -> Vec<ColumnDef> {
        let col = |id: &str, field_type: FieldType| ColumnDef {
            id: id.into(),
            header: id.into(),
            field_type,
            sortable: field_type.is_scalar(),
            filterable: field_type.is_scalar(),
            options: None,
        };
        vec![
            col("name", FieldType::String),
            col("amount", FieldType::Number),
            col("tags", FieldType::Array),
        ]
    }

    struct Harness {
        columns: Vec<ColumnDef>,
        config: ViewConfig,
        data: Fixed,
    }

    impl Harness {
        fn new(len: usize) -> Self {
            Self {
                columns: columns(),
                config: ViewConfig::default(),
                data: Fixed { len },
            }
        }

        fn apply(&self, state: &ViewState, action: ViewAction) -> Result<ViewState, ViewError> {
            let ctx = ReduceContext {
                columns: &self.columns,
                config: &self.config,
                data: &self.data,
            };
            reduce(state, &action, &ctx)
        }
    }

    fn at_page(index: usize) -> ViewState {
        let mut state = ViewState::default();
        state.pagination.page_index = index;
        state
    }

    // -- Filters --

    #[test]
    fn global_filter_resets_page_even_without_count_change() {
        let h = Harness::new(100);
        let next = h
            .apply(&at_page(3), ViewAction::SetGlobalFilter { text: "x".into() })
            .expect("apply");
        assert_eq!(next.pagination.page_index, 0);
        assert_eq!(next.global_filter, "x");
    }

    #[test]
    fn column_filter_set_and_clear_reset_page() {
        let h = Harness::new(100);
        let set = h
            .apply(
                &at_page(3),
                ViewAction::SetColumnFilter {
                    column: "name".into(),
                    value: FilterValue::equals("acme"),
                },
            )
            .expect("apply");
        assert_eq!(set.pagination.page_index, 0);
        assert!(set.column_filters.contains_key("name"));

        let mut moved = set.clone();
        moved.pagination.page_index = 2;
        let cleared = h
            .apply(&moved, ViewAction::ClearColumnFilter { column: "name".into() })
            .expect("apply");
        assert_eq!(cleared.pagination.page_index, 0);
        assert!(cleared.column_filters.is_empty());
    }

    #[test]
    fn filtering_non_scalar_column_is_rejected() {
        let h = Harness::new(10);
        let err = h
            .apply(
                &ViewState::default(),
                ViewAction::SetColumnFilter {
                    column: "tags".into(),
                    value: FilterValue::equals("x"),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ViewError::ColumnNotFilterable { .. }));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let h = Harness::new(10);
        let err = h
            .apply(
                &ViewState::default(),
                ViewAction::SetColumnVisibility {
                    column: "ghost".into(),
                    visible: false,
                },
            )
            .unwrap_err();
        assert_eq!(err, ViewError::UnknownColumn { column: "ghost".into() });
    }

    // -- Sorting --

    #[test]
    fn toggle_cycles_through_three_states() {
        let h = Harness::new(10);
        let toggle = ViewAction::ToggleSort {
            column: "amount".into(),
            additive: false,
        };
        let asc = h.apply(&ViewState::default(), toggle.clone()).expect("apply");
        assert_eq!(asc.sort_direction("amount"), Some(SortDirection::Asc));
        let desc = h.apply(&asc, toggle.clone()).expect("apply");
        assert_eq!(desc.sort_direction("amount"), Some(SortDirection::Desc));
        let off = h.apply(&desc, toggle).expect("apply");
        assert!(off.sorting.is_empty());
    }

    #[test]
    fn single_sort_replaces_previous_column() {
        let h = Harness::new(10);
        let by_name = h
            .apply(
                &ViewState::default(),
                ViewAction::SetSort {
                    column: "name".into(),
                    direction: Some(SortDirection::Asc),
                },
            )
            .expect("apply");
        let by_amount = h
            .apply(
                &by_name,
                ViewAction::SetSort {
                    column: "amount".into(),
                    direction: Some(SortDirection::Desc),
                },
            )
            .expect("apply");
        assert_eq!(by_amount.sorting, vec![SortEntry::new("amount", SortDirection::Desc)]);

        let cleared = h
            .apply(
                &by_amount,
                ViewAction::SetSort {
                    column: "amount".into(),
                    direction: None,
                },
            )
            .expect("apply");
        assert!(cleared.sorting.is_empty());
    }

    #[test]
    fn additive_sort_requires_multi_sort_config() {
        let mut h = Harness::new(10);
        let mut state = ViewState::default();
        state.sorting.push(SortEntry::new("name", SortDirection::Asc));
        let add = ViewAction::AddSort {
            column: "amount".into(),
            direction: SortDirection::Desc,
        };

        let single = h.apply(&state, add.clone()).expect("apply");
        assert_eq!(single.sorting.len(), 1);

        h.config.enable_multi_sort = true;
        let multi = h.apply(&state, add).expect("apply");
        assert_eq!(
            multi.sorting,
            vec![
                SortEntry::new("name", SortDirection::Asc),
                SortEntry::new("amount", SortDirection::Desc),
            ]
        );

        let toggled = h
            .apply(
                &multi,
                ViewAction::ToggleSort {
                    column: "name".into(),
                    additive: true,
                },
            )
            .expect("apply");
        assert_eq!(toggled.sorting[0], SortEntry::new("name", SortDirection::Desc));
        assert_eq!(toggled.sorting.len(), 2);
    }

    #[test]
    fn sorting_non_scalar_column_is_rejected() {
        let h = Harness::new(10);
        let err = h
            .apply(
                &ViewState::default(),
                ViewAction::ToggleSort {
                    column: "tags".into(),
                    additive: false,
                },
            )
            .unwrap_err();
        assert_eq!(err, ViewError::ColumnNotSortable { column: "tags".into() });
    }

    // -- Pagination --

    #[test]
    fn navigation_is_clamped() {
        let h = Harness::new(25);
        let last = h.apply(&ViewState::default(), ViewAction::LastPage).expect("apply");
        assert_eq!(last.pagination.page_index, 2);
        let still_last = h.apply(&last, ViewAction::NextPage).expect("apply");
        assert_eq!(still_last.pagination.page_index, 2);
        let first = h.apply(&ViewState::default(), ViewAction::PreviousPage).expect("apply");
        assert_eq!(first.pagination.page_index, 0);
        let far = h
            .apply(&ViewState::default(), ViewAction::SetPageIndex { index: 99 })
            .expect("apply");
        assert_eq!(far.pagination.page_index, 2);
    }

    #[test]
    fn page_size_resets_index_and_rejects_zero() {
        let h = Harness::new(100);
        let next = h
            .apply(&at_page(4), ViewAction::SetPageSize { size: 25 })
            .expect("apply");
        assert_eq!(next.pagination.page_index, 0);
        assert_eq!(next.pagination.page_size, 25);

        let err = h
            .apply(&at_page(4), ViewAction::SetPageSize { size: 0 })
            .unwrap_err();
        assert_eq!(err, ViewError::InvalidPageSize);
    }

    #[test]
    fn zero_page_size_in_state_cannot_be_navigated() {
        let h = Harness::new(10);
        let mut broken = ViewState::default();
        broken.pagination.page_size = 0;
        assert_eq!(
            h.apply(&broken, ViewAction::NextPage).unwrap_err(),
            ViewError::InvalidPageSize
        );
    }

    #[test]
    fn empty_result_keeps_single_page() {
        let h = Harness::new(40);
        let mut state = at_page(3);
        state.global_filter = "none".into();
        let next = h.apply(&state, ViewAction::NextPage).expect("apply");
        assert_eq!(next.pagination.page_index, 0);
    }

    // -- Selection --

    #[test]
    fn toggle_selection_requires_known_key() {
        let h = Harness::new(3);
        let on = h
            .apply(&ViewState::default(), ViewAction::ToggleRowSelection { key: "r1".into() })
            .expect("apply");
        assert!(on.row_selection.contains("r1"));
        let off = h
            .apply(&on, ViewAction::ToggleRowSelection { key: "r1".into() })
            .expect("apply");
        assert!(off.row_selection.is_empty());

        let err = h
            .apply(&on, ViewAction::ToggleRowSelection { key: "r9".into() })
            .unwrap_err();
        assert_eq!(err, ViewError::UnknownRow { key: "r9".into() });
    }

    #[test]
    fn select_all_on_page_adds_only_page_keys() {
        let h = Harness::new(25);
        let next = h.apply(&at_page(2), ViewAction::SelectAllOnPage).expect("apply");
        let expected: BTreeSet<RowKey> = (20..25).map(|i| format!("r{i}")).collect();
        assert_eq!(next.row_selection, expected);
        let cleared = h.apply(&next, ViewAction::ClearSelection).expect("apply");
        assert!(cleared.row_selection.is_empty());
    }

    #[test]
    fn select_all_on_empty_page_is_noop() {
        let h = Harness::new(0);
        let next = h
            .apply(&ViewState::default(), ViewAction::SelectAllOnPage)
            .expect("apply");
        assert!(next.row_selection.is_empty());
    }

    // -- Reset --

    #[test]
    fn reset_returns_to_configured_state() {
        let mut h = Harness::new(50);
        h.config = ViewConfig::default()
            .with_page_size(20)
            .with_sort("amount", SortDirection::Desc);
        let mut state = h.config.initial_state.clone();
        state.global_filter = "x".into();
        state.sorting.clear();
        state.pagination = PaginationState {
            page_index: 1,
            page_size: 5,
        };

        let reset = h.apply(&state, ViewAction::Reset).expect("apply");
        assert_eq!(reset, h.config.initial_state);
        assert_eq!(reset.pagination.page_size, 20);
        assert_eq!(reset.sort_direction("amount"), Some(SortDirection::Desc));
    }

    #[test]
    fn reset_clamps_configured_page_onto_data() {
        let mut h = Harness::new(3);
        h.config.initial_state.pagination.page_index = 7;

        let reset = h.apply(&at_page(0), ViewAction::Reset).expect("apply");
        assert_eq!(reset.pagination.page_index, 0);
    }
}
