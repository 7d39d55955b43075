//! Tabular view state: slices, actions, reducer, selectors and the store
//! that ties them to a dataset.

pub mod action;
pub mod column;
pub mod error;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;

pub use action::ViewAction;
pub use column::{columns_for, ColumnDef};
pub use error::ViewError;
pub use reducer::{reduce, Dataset, ReduceContext};
pub use state::{
    FilterValue, PaginationState, SliceChanges, SortDirection, SortEntry, ViewState,
    DEFAULT_PAGE_SIZE,
};
pub use store::ViewStore;
