//! View lifecycle observers.
//!
//! [`ViewObserver`] reacts to state changes of mounted views;
//! [`CompositeViewObserver`] fans one notification out to many observers.

use std::sync::Arc;

use schemaview_core::{SliceChanges, ViewAction, ViewError, ViewStore};

/// What produced a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// A dispatched action, by its wire name.
    Action(&'static str),
    /// The dataset was replaced.
    Data,
    /// A saved state was restored.
    Restore,
}

/// One committed state change of a mounted view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChange<'a> {
    pub view: &'a str,
    pub cause: ChangeCause,
    pub changes: SliceChanges,
}

/// Observer of mounted views.
///
/// Notifications for one view arrive in commit order. Only changes that
/// touched at least one slice are reported through `on_change`.
///
/// Used as `Arc<dyn ViewObserver>`.
pub trait ViewObserver: Send + Sync {
    /// Called after a view is mounted and seeded.
    fn on_mount(&self, _view: &str, _store: &ViewStore) {}

    /// Called after a change is committed and published.
    fn on_change(&self, change: &ViewChange<'_>, store: &ViewStore);

    /// Called when an action is rejected; the state did not change.
    fn on_rejected(&self, _view: &str, _action: &ViewAction, _error: &ViewError) {}

    /// Called before a view is dropped from its registry.
    fn on_unmount(&self, _view: &str, _store: &ViewStore) {}
}

/// Fans out to multiple observers in registration order.
#[derive(Default)]
pub struct CompositeViewObserver {
    observers: Vec<Arc<dyn ViewObserver>>,
}

impl CompositeViewObserver {
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn ViewObserver>>) -> Self {
        Self { observers }
    }

    /// Appends `observer`; it is notified after those already added.
    pub fn add(&mut self, observer: Arc<dyn ViewObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` when fan-out reaches no observer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ViewObserver for CompositeViewObserver {
    fn on_mount(&self, view: &str, store: &ViewStore) {
        for observer in &self.observers {
            observer.on_mount(view, store);
        }
    }

    fn on_change(&self, change: &ViewChange<'_>, store: &ViewStore) {
        for observer in &self.observers {
            observer.on_change(change, store);
        }
    }

    fn on_rejected(&self, view: &str, action: &ViewAction, error: &ViewError) {
        for observer in &self.observers {
            observer.on_rejected(view, action, error);
        }
    }

    fn on_unmount(&self, view: &str, store: &ViewStore) {
        for observer in &self.observers {
            observer.on_unmount(view, store);
        }
    }
}
