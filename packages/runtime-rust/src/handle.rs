//! Shared handle to one mounted view.
//!
//! A [`ViewHandle`] serializes writers through a mutex and publishes an
//! immutable [`ViewStore`] snapshot after every committed change. Readers
//! load the latest snapshot lock-free and never block a dispatch.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::info_span;

use schemaview_core::{PageMarker, Row, SliceChanges, ViewAction, ViewError, ViewState, ViewStore};

use crate::error::RuntimeError;
use crate::observer::{ChangeCause, ViewChange, ViewObserver};
use crate::preferences::ViewPreferences;

// ---------------------------------------------------------------------------
// ViewHandle
// ---------------------------------------------------------------------------

/// One mounted view: a write-serialized [`ViewStore`] plus its latest
/// published snapshot.
///
/// Handles are shared as `Arc<ViewHandle>` between the registry and callers.
pub struct ViewHandle {
    id: String,
    writer: Mutex<ViewStore>,
    published: ArcSwap<ViewStore>,
    observer: Arc<dyn ViewObserver>,
    max_visible_pages: usize,
}

impl ViewHandle {
    /// Wraps `store`; its current state becomes the first snapshot.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        store: ViewStore,
        observer: Arc<dyn ViewObserver>,
        max_visible_pages: usize,
    ) -> Self {
        Self {
            id: id.into(),
            published: ArcSwap::new(Arc::new(store.clone())),
            writer: Mutex::new(store),
            observer,
            max_visible_pages,
        }
    }

    /// The id the view was mounted under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest published store. Selectors on it see one consistent state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ViewStore> {
        self.published.load_full()
    }

    /// Owned copy of the latest published state.
    ///
    /// Use [`ViewHandle::snapshot`] when selectors must see the same state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.published.load().snapshot()
    }

    /// Page strip of the latest snapshot at the runtime's configured width.
    #[must_use]
    pub fn page_strip(&self) -> Vec<PageMarker> {
        self.published.load().page_strip(self.max_visible_pages)
    }

    /// Persistable slices of the latest published state.
    #[must_use]
    pub fn preferences(&self) -> ViewPreferences {
        ViewPreferences::capture(self.published.load().state())
    }

    /// Applies `action`, publishes the result and notifies observers.
    ///
    /// Concurrent dispatches on one handle apply in lock order. Rejected
    /// actions leave the published snapshot untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::View`] when the reducer rejects the action.
    pub fn dispatch(&self, action: &ViewAction) -> Result<SliceChanges, RuntimeError> {
        let name = action.name();
        let span = info_span!(
            "dispatch",
            view = %self.id,
            action = name,
            duration_us = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let _entered = span.enter();

        let start = Instant::now();
        let result = self.commit(ChangeCause::Action(name), |store| store.dispatch(action));

        #[allow(clippy::cast_possible_truncation)]
        let duration_us = start.elapsed().as_micros() as u64;
        let outcome = match &result {
            Ok(changes) if changes.any() => "applied",
            Ok(_) => "unchanged",
            Err(_) => "rejected",
        };
        span.record("duration_us", duration_us);
        span.record("outcome", outcome);

        match result {
            Ok(changes) => {
                tracing::debug!(view = %self.id, action = name, duration_us, outcome, "dispatch complete");
                Ok(changes)
            }
            Err(err) => {
                tracing::warn!(view = %self.id, action = name, error = %err, "action rejected");
                self.observer.on_rejected(&self.id, action, &err);
                Err(RuntimeError::view(&self.id, err))
            }
        }
    }

    /// Replaces the dataset of this view.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::View`] when the rows cannot be keyed.
    pub fn set_rows(&self, rows: Vec<Row>) -> Result<SliceChanges, RuntimeError> {
        self.commit(ChangeCause::Data, |store| store.set_rows(rows))
            .map_err(|err| RuntimeError::view(&self.id, err))
    }

    /// Replaces the state, e.g. with one loaded from storage.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::View`] when `state` does not fit the columns.
    pub fn restore(&self, state: ViewState) -> Result<SliceChanges, RuntimeError> {
        self.commit(ChangeCause::Restore, |store| store.restore(state))
            .map_err(|err| RuntimeError::view(&self.id, err))
    }

    pub(crate) fn observer(&self) -> &dyn ViewObserver {
        &*self.observer
    }

    /// Runs `apply` under the write lock. A change that touched any slice
    /// is published, then observers are notified before the lock is
    /// released, so notifications follow commit order.
    fn commit<F>(&self, cause: ChangeCause, apply: F) -> Result<SliceChanges, ViewError>
    where
        F: FnOnce(&mut ViewStore) -> Result<SliceChanges, ViewError>,
    {
        let mut writer = self.writer.lock();
        let changes = apply(&mut *writer)?;
        if changes.any() || cause == ChangeCause::Data {
            let published = Arc::new(writer.clone());
            self.published.store(Arc::clone(&published));
            if changes.any() {
                let change = ViewChange {
                    view: &self.id,
                    cause,
                    changes,
                };
                self.observer.on_change(&change, &published);
            }
        }
        Ok(changes)
    }
}

impl std::fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewHandle")
            .field("id", &self.id)
            .field("state", &self.published.load().state())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use schemaview_core::{introspect, row, Schema, ViewConfig};

    use super::*;
    use crate::observer::CompositeViewObserver;

    struct Recorder {
        changes: Mutex<Vec<(ChangeCause, SliceChanges)>>,
        rejected: AtomicU32,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                changes: Mutex::new(Vec::new()),
                rejected: AtomicU32::new(0),
            })
        }
    }

    impl ViewObserver for Recorder {
        fn on_change(&self, change: &ViewChange<'_>, _store: &ViewStore) {
            self.changes.lock().push((change.cause, change.changes));
        }

        fn on_rejected(&self, _view: &str, _action: &ViewAction, _error: &ViewError) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| row([("name", format!("row {i:02}").into())]))
            .collect()
    }

    fn handle(observer: Arc<dyn ViewObserver>) -> ViewHandle {
        let schema = Schema::object([("name", Schema::string())]);
        let store = ViewStore::new(&introspect(&schema), ViewConfig::default().with_page_size(5))
            .expect("store")
            .with_rows(rows(12))
            .expect("rows");
        ViewHandle::new("people", store, observer, 5)
    }

    // ---- Publishing ----

    #[test]
    fn dispatch_publishes_new_snapshot() {
        let handle = handle(Arc::new(CompositeViewObserver::default()));
        let before = handle.snapshot();

        let changes = handle.dispatch(&ViewAction::NextPage).expect("dispatch");

        assert!(changes.pagination);
        assert_eq!(before.state().pagination.page_index, 0);
        assert_eq!(handle.state().pagination.page_index, 1);
        assert_eq!(handle.snapshot().page_rows().len(), 5);
    }

    #[test]
    fn no_op_dispatch_keeps_snapshot() {
        let handle = handle(Arc::new(CompositeViewObserver::default()));
        let before = handle.snapshot();

        let changes = handle.dispatch(&ViewAction::FirstPage).expect("dispatch");

        assert!(!changes.any());
        assert!(Arc::ptr_eq(&before, &handle.snapshot()));
    }

    #[test]
    fn rejected_action_leaves_state_and_notifies() {
        let recorder = Recorder::new();
        let handle = handle(recorder.clone());

        let err = handle
            .dispatch(&ViewAction::SetPageSize { size: 0 })
            .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::View { source: ViewError::InvalidPageSize, .. }
        ));
        assert_eq!(handle.state().pagination.page_size, 5);
        assert_eq!(recorder.rejected.load(Ordering::Relaxed), 1);
        assert!(recorder.changes.lock().is_empty());
    }

    // ---- Observers ----

    #[test]
    fn observers_see_causes_in_commit_order() {
        let recorder = Recorder::new();
        let handle = handle(recorder.clone());

        handle.dispatch(&ViewAction::LastPage).expect("last");
        handle.set_rows(rows(3)).expect("rows");
        let mut state = handle.state();
        state.global_filter = "row".into();
        handle.restore(state).expect("restore");

        let log = recorder.changes.lock();
        let causes: Vec<_> = log.iter().map(|(cause, _)| *cause).collect();
        assert_eq!(
            causes,
            vec![
                ChangeCause::Action("lastPage"),
                ChangeCause::Data,
                ChangeCause::Restore,
            ]
        );
        assert!(log[1].1.pagination);
        assert!(log[2].1.filters);
    }

    #[test]
    fn data_replacement_publishes_even_without_slice_changes() {
        let handle = handle(Arc::new(CompositeViewObserver::default()));
        handle.set_rows(rows(20)).expect("rows");
        assert_eq!(handle.snapshot().total_rows(), 20);
        assert_eq!(handle.page_strip().len(), 4);
    }
}
