use crate::descriptor::FieldType;

/// Programmer errors rejected by the view store.
///
/// User-facing conditions (an empty result set, a page index past the end)
/// are never errors; they are clamped or rendered as empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ViewError {
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("column '{column}' is not sortable")]
    ColumnNotSortable { column: String },

    #[error("column '{column}' ({field_type}) is not filterable")]
    ColumnNotFilterable { column: String, field_type: FieldType },

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("unknown row key '{key}'")]
    UnknownRow { key: String },

    #[error("duplicate row key '{key}' at index {index}")]
    DuplicateRowKey { key: String, index: usize },

    #[error("row {index} has no value for key field '{field}'")]
    MissingRowKey { index: usize, field: String },
}
