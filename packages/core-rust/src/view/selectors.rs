//! Pure derived reads over `(rows, state, columns)`.
//!
//! Everything here works on row indices so the store can memoize one
//! ordering and hand out borrowed rows from it.

use std::cmp::Ordering;
use std::ops::Range;

use super::column::ColumnDef;
use super::state::{FilterValue, PaginationState, SortDirection, ViewState};
use crate::descriptor::FieldType;
use crate::types::{Row, Value};

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Indices of rows passing the global filter and every column filter, in
/// dataset order.
///
/// The global filter is a case-insensitive substring match over the visible,
/// filterable columns. Column filters naming unknown columns match nothing,
/// so a stale restored filter hides rows rather than being silently dropped.
#[must_use]
pub fn filtered_indices(rows: &[Row], state: &ViewState, columns: &[ColumnDef]) -> Vec<usize> {
    let needle = state.global_filter.trim().to_lowercase();
    let searchable: Vec<&ColumnDef> = columns
        .iter()
        .filter(|c| c.filterable && state.is_column_visible(&c.id))
        .collect();
    let column_filters: Vec<(Option<&ColumnDef>, &FilterValue)> = state
        .column_filters
        .iter()
        .map(|(id, filter)| (columns.iter().find(|c| &c.id == id), filter))
        .collect();

    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            (needle.is_empty()
                || searchable.iter().any(|c| {
                    row.get(&c.id)
                        .is_some_and(|cell| cell.display_text().to_lowercase().contains(&needle))
                }))
                && column_filters.iter().all(|(column, filter)| {
                    column.is_some_and(|c| {
                        filter_matches(c.field_type, row.get(&c.id).unwrap_or(&Value::Null), filter)
                    })
                })
        })
        .map(|(i, _)| i)
        .collect()
}

/// Whether `cell` satisfies `filter` under the semantics of `field_type`.
#[must_use]
pub fn filter_matches(field_type: FieldType, cell: &Value, filter: &FilterValue) -> bool {
    match filter {
        FilterValue::Value { value } => value_matches(field_type, cell, value),
        FilterValue::Range { min, max } => cell.as_f64().is_some_and(|n| {
            min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
        }),
        FilterValue::DateRange { from, to } => cell.as_datetime().is_some_and(|d| {
            from.map_or(true, |lo| d >= lo) && to.map_or(true, |hi| d <= hi)
        }),
    }
}

fn value_matches(field_type: FieldType, cell: &Value, wanted: &Value) -> bool {
    match field_type {
        FieldType::Enum => match wanted {
            Value::Array(any_of) => any_of
                .iter()
                .any(|w| w.display_text() == cell.display_text()),
            _ => wanted.display_text() == cell.display_text(),
        },
        FieldType::Boolean => wanted.as_bool().is_some_and(|w| cell.as_bool() == Some(w)),
        FieldType::Number => match (wanted.as_f64(), cell.as_f64()) {
            (Some(w), Some(c)) => (w - c).abs() < f64::EPSILON,
            _ => false,
        },
        FieldType::Date => match (wanted.as_datetime(), cell.as_datetime()) {
            (Some(w), Some(c)) => w.date_naive() == c.date_naive(),
            _ => false,
        },
        FieldType::String | FieldType::Array | FieldType::Object => cell
            .display_text()
            .to_lowercase()
            .contains(&wanted.display_text().to_lowercase()),
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Stably orders `indices` by the active sort list.
///
/// Null or unparseable cells sort after every value in both directions.
/// Sort entries naming unknown columns are ignored.
pub fn sort_indices(rows: &[Row], indices: &mut [usize], state: &ViewState, columns: &[ColumnDef]) {
    let keys: Vec<(&str, FieldType, SortDirection)> = state
        .sorting
        .iter()
        .filter_map(|entry| {
            columns
                .iter()
                .find(|c| c.id == entry.column_name)
                .map(|c| (c.id.as_str(), c.field_type, entry.direction))
        })
        .collect();
    if keys.is_empty() {
        return;
    }

    // slice::sort_by is stable; equal keys keep filtered order.
    indices.sort_by(|&a, &b| {
        keys.iter()
            .map(|&(id, field_type, direction)| {
                compare_cells(field_type, rows[a].get(id), rows[b].get(id), direction)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_cells(
    field_type: FieldType,
    a: Option<&Value>,
    b: Option<&Value>,
    direction: SortDirection,
) -> Ordering {
    let a = a.and_then(|v| SortKey::of(field_type, v));
    let b = b.and_then(|v| SortKey::of(field_type, v));
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.compare(&b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Comparable projection of a cell for one field type.
#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Instant(i64),
    Flag(bool),
    Text(String),
}

impl SortKey {
    fn of(field_type: FieldType, value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        match field_type {
            FieldType::Number => value.as_f64().filter(|n| !n.is_nan()).map(Self::Number),
            FieldType::Date => value
                .as_datetime()
                .map(|d| Self::Instant(d.timestamp_millis())),
            FieldType::Boolean => value.as_bool().map(Self::Flag),
            FieldType::String | FieldType::Enum | FieldType::Array | FieldType::Object => {
                Some(Self::Text(value.display_text()))
            }
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// `ceil(filtered / page_size)`, never less than 1.
#[must_use]
pub fn page_count(filtered: usize, page_size: usize) -> usize {
    filtered.div_ceil(page_size.max(1)).max(1)
}

/// Index range of the current page within an ordering of `len` rows.
/// Empty when the page lies past the end.
#[must_use]
pub fn page_bounds(len: usize, pagination: PaginationState) -> Range<usize> {
    let size = pagination.page_size.max(1);
    let start = pagination.page_index.saturating_mul(size).min(len);
    let end = start.saturating_add(size).min(len);
    start..end
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::row;
    use crate::view::state::SortEntry;

    fn column(id: &str, field_type: FieldType) -> ColumnDef {
        ColumnDef {
            id: id.into(),
            header: id.into(),
            field_type,
            sortable: true,
            filterable: true,
            options: None,
        }
    }

    fn kv_rows() -> Vec<Row> {
        vec![
            row([("k", Value::from(1i64)), ("v", Value::from("b"))]),
            row([("k", Value::from(2i64)), ("v", Value::from("a"))]),
            row([("k", Value::from(3i64)), ("v", Value::from("a"))]),
        ]
    }

    fn sorted_by(rows: &[Row], columns: &[ColumnDef], entries: Vec<SortEntry>) -> Vec<usize> {
        let state = ViewState {
            sorting: entries,
            ..ViewState::default()
        };
        let mut indices = filtered_indices(rows, &state, columns);
        sort_indices(rows, &mut indices, &state, columns);
        indices
    }

    // -- Sorting --

    #[test]
    fn equal_keys_keep_original_order() {
        let rows = kv_rows();
        let columns = [column("k", FieldType::Number), column("v", FieldType::String)];
        let order = sorted_by(&rows, &columns, vec![SortEntry::new("v", SortDirection::Asc)]);
        let ks: Vec<_> = order.iter().map(|&i| rows[i]["k"].clone()).collect();
        assert_eq!(ks, vec![Value::from(2i64), Value::from(3i64), Value::from(1i64)]);
    }

    #[test]
    fn numbers_compare_numerically() {
        let rows: Vec<Row> = [10i64, 9, 100]
            .into_iter()
            .map(|n| row([("n", Value::from(n))]))
            .collect();
        let columns = [column("n", FieldType::Number)];
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("n", SortDirection::Asc)]),
            vec![1, 0, 2]
        );
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("n", SortDirection::Desc)]),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn dates_compare_chronologically() {
        let rows = vec![
            row([("d", Value::from("2024-03-01"))]),
            row([("d", Value::from("2023-12-31T23:00:00Z"))]),
            row([("d", Value::from("2024-01-15"))]),
        ];
        let columns = [column("d", FieldType::Date)];
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("d", SortDirection::Asc)]),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn booleans_sort_false_first() {
        let rows = vec![
            row([("b", Value::from(true))]),
            row([("b", Value::from(false))]),
        ];
        let columns = [column("b", FieldType::Boolean)];
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("b", SortDirection::Asc)]),
            vec![1, 0]
        );
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let rows = vec![
            row([("n", Value::Null)]),
            row([("n", Value::from(2i64))]),
            Row::new(),
            row([("n", Value::from(1i64))]),
        ];
        let columns = [column("n", FieldType::Number)];
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("n", SortDirection::Asc)]),
            vec![3, 1, 0, 2]
        );
        assert_eq!(
            sorted_by(&rows, &columns, vec![SortEntry::new("n", SortDirection::Desc)]),
            vec![1, 3, 0, 2]
        );
    }

    #[test]
    fn secondary_key_breaks_ties() {
        let rows = kv_rows();
        let columns = [column("k", FieldType::Number), column("v", FieldType::String)];
        let order = sorted_by(
            &rows,
            &columns,
            vec![
                SortEntry::new("v", SortDirection::Asc),
                SortEntry::new("k", SortDirection::Desc),
            ],
        );
        assert_eq!(order, vec![2, 1, 0]);
    }

    // -- Filtering --

    #[test]
    fn global_filter_is_case_insensitive_over_visible_columns() {
        let rows = vec![
            row([("name", Value::from("Acme Corp")), ("notes", Value::from("x"))]),
            row([("name", Value::from("Globex")), ("notes", Value::from("acme partner"))]),
        ];
        let columns = [column("name", FieldType::String), column("notes", FieldType::String)];
        let mut state = ViewState {
            global_filter: "ACME".into(),
            ..ViewState::default()
        };
        assert_eq!(filtered_indices(&rows, &state, &columns), vec![0, 1]);

        state.column_visibility.insert("notes".into(), false);
        assert_eq!(filtered_indices(&rows, &state, &columns), vec![0]);
    }

    #[test]
    fn enum_filter_is_exact() {
        let statuses = ["approved", "approved-pending", "draft"];
        let rows: Vec<Row> = statuses.iter().map(|s| row([("status", Value::from(*s))])).collect();
        let columns = [column("status", FieldType::Enum)];
        let mut state = ViewState::default();
        state
            .column_filters
            .insert("status".into(), FilterValue::equals("approved"));
        assert_eq!(filtered_indices(&rows, &state, &columns), vec![0]);

        state.column_filters.insert(
            "status".into(),
            FilterValue::equals(Value::Array(vec!["draft".into(), "approved".into()])),
        );
        assert_eq!(filtered_indices(&rows, &state, &columns), vec![0, 2]);
    }

    #[test]
    fn string_filter_is_substring() {
        assert!(filter_matches(
            FieldType::String,
            &Value::from("Vendor Legal Name"),
            &FilterValue::equals("legal")
        ));
        assert!(!filter_matches(FieldType::String, &Value::Null, &FilterValue::equals("x")));
    }

    #[test]
    fn boolean_filter_accepts_text() {
        assert!(filter_matches(FieldType::Boolean, &Value::from(true), &FilterValue::equals("true")));
        assert!(!filter_matches(FieldType::Boolean, &Value::from(false), &FilterValue::equals(true)));
    }

    #[test]
    fn number_filter_by_range_or_equality() {
        let range = FilterValue::range(Some(10.0), Some(20.0));
        assert!(filter_matches(FieldType::Number, &Value::from(10i64), &range));
        assert!(filter_matches(FieldType::Number, &Value::from(20.0), &range));
        assert!(!filter_matches(FieldType::Number, &Value::from(20.5), &range));
        assert!(!filter_matches(FieldType::Number, &Value::Null, &range));
        assert!(filter_matches(FieldType::Number, &Value::from(7i64), &FilterValue::equals("7")));
    }

    #[test]
    fn date_filter_by_day_or_range() {
        let cell = Value::from("2024-03-01T15:30:00Z");
        assert!(filter_matches(FieldType::Date, &cell, &FilterValue::equals("2024-03-01")));
        let from = Value::from("2024-02-01").as_datetime();
        let to = Value::from("2024-02-29").as_datetime();
        assert!(!filter_matches(FieldType::Date, &cell, &FilterValue::date_range(from, to)));
        assert!(filter_matches(FieldType::Date, &cell, &FilterValue::date_range(from, None)));
    }

    #[test]
    fn filter_on_unknown_column_matches_nothing() {
        let rows = kv_rows();
        let mut state = ViewState::default();
        state.column_filters.insert("gone".into(), FilterValue::equals("a"));
        assert!(filtered_indices(&rows, &state, &[column("v", FieldType::String)]).is_empty());
    }

    // -- Pagination --

    #[test]
    fn page_count_floors_at_one() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn page_bounds_slice_the_ordering() {
        let p = |page_index, page_size| PaginationState { page_index, page_size };
        assert_eq!(page_bounds(25, p(2, 10)), 20..25);
        assert_eq!(page_bounds(25, p(0, 10)), 0..10);
        assert_eq!(page_bounds(0, p(0, 10)), 0..0);
        assert_eq!(page_bounds(5, p(9, 10)), 5..5);
    }

    proptest! {
        #[test]
        fn pages_partition_the_rows(len in 0usize..300, size in 1usize..40) {
            let count = page_count(len, size);
            let mut covered = 0;
            for index in 0..count {
                let range = page_bounds(len, PaginationState { page_index: index, page_size: size });
                prop_assert_eq!(range.start, covered);
                prop_assert!(range.len() <= size);
                covered = range.end;
            }
            prop_assert_eq!(covered, len);
        }

        #[test]
        fn sorting_is_a_stable_permutation(values in proptest::collection::vec(0i64..5, 0..60)) {
            let rows: Vec<Row> = values
                .iter()
                .enumerate()
                .map(|(i, v)| row([("i", Value::from(i as i64)), ("v", Value::from(*v))]))
                .collect();
            let columns = [column("v", FieldType::Number)];
            let order = sorted_by(&rows, &columns, vec![SortEntry::new("v", SortDirection::Asc)]);

            prop_assert_eq!(order.len(), rows.len());
            for pair in order.windows(2) {
                let (a, b) = (values[pair[0]], values[pair[1]]);
                prop_assert!(a <= b);
                if a == b {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }
    }
}
