//! Mounting, lookup and teardown of named views.
//!
//! Mounting applies persisted preferences; unmounting saves them back.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use schemaview_core::{columns_for, SchemaDefinition, SliceChanges, ViewAction, ViewConfig, ViewStore};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::handle::ViewHandle;
use crate::observer::{CompositeViewObserver, ViewObserver};
use crate::preferences::{PreferenceStore, ViewPreferences};

// ---------------------------------------------------------------------------
// ViewRegistry
// ---------------------------------------------------------------------------

/// Registry of mounted views, keyed by view id.
///
/// Every mount owns its own [`ViewStore`]; two views never share state, even
/// when built from the same schema. Views are unmounted in reverse mount
/// order by [`ViewRegistry::unmount_all`].
pub struct ViewRegistry {
    views: DashMap<String, Arc<ViewHandle>>,
    /// Mount order for deterministic teardown.
    mount_order: RwLock<Vec<String>>,
    config: Arc<RuntimeConfig>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    observers: Vec<Arc<dyn ViewObserver>>,
}

impl ViewRegistry {
    /// Creates an empty registry without preference persistence.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            views: DashMap::new(),
            mount_order: RwLock::new(Vec::new()),
            config: Arc::new(config),
            preferences: None,
            observers: Vec::new(),
        }
    }

    /// Persists view preferences in `store`. Ignored when
    /// `persist_preferences` is off.
    #[must_use]
    pub fn with_preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(store);
        self
    }

    /// Adds an observer for views mounted after this call.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ViewObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Mounts a view over `definition` using the runtime defaults.
    ///
    /// # Errors
    ///
    /// See [`ViewRegistry::mount`].
    pub fn mount_with_defaults(
        &self,
        id: impl Into<String>,
        definition: &SchemaDefinition,
    ) -> Result<Arc<ViewHandle>, RuntimeError> {
        self.mount(id, definition, self.config.view_config())
    }

    /// Mounts a view with one column per field of `definition`.
    ///
    /// Saved preferences for `id` are overlaid on `config.initial_state`.
    /// A preference store that fails to load is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::DuplicateView`] if `id` is mounted, or
    /// [`RuntimeError::View`] if `config` does not fit the columns.
    pub fn mount(
        &self,
        id: impl Into<String>,
        definition: &SchemaDefinition,
        mut config: ViewConfig,
    ) -> Result<Arc<ViewHandle>, RuntimeError> {
        let id = id.into();
        if self.views.contains_key(&id) {
            return Err(RuntimeError::DuplicateView { id });
        }

        let columns = columns_for(definition);
        if let Some(saved) = self.load_preferences(&id) {
            let skipped = saved.apply_to(&mut config.initial_state, &columns);
            tracing::debug!(view = %id, skipped, "seeded view from saved preferences");
        }
        let store =
            ViewStore::with_columns(columns, config).map_err(|err| RuntimeError::view(&id, err))?;

        let observer = Arc::new(CompositeViewObserver::new(self.observers.clone()));
        let handle = Arc::new(ViewHandle::new(
            id.clone(),
            store,
            observer,
            self.config.max_visible_pages,
        ));

        match self.views.entry(id.clone()) {
            Entry::Occupied(_) => return Err(RuntimeError::DuplicateView { id }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&handle));
            }
        }
        self.mount_order.write().push(id.clone());

        tracing::info!(view = %id, schema = %definition.name, "view mounted");
        handle.observer().on_mount(&id, &handle.snapshot());
        Ok(handle)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<ViewHandle>> {
        self.views.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownView`] if `id` is not mounted.
    pub fn handle(&self, id: &str) -> Result<Arc<ViewHandle>, RuntimeError> {
        self.get(id).ok_or_else(|| RuntimeError::UnknownView { id: id.to_string() })
    }

    /// Dispatches `action` to the view `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownView`] or the view's rejection.
    pub fn dispatch(&self, id: &str, action: &ViewAction) -> Result<SliceChanges, RuntimeError> {
        self.handle(id)?.dispatch(action)
    }

    /// Returns the view `id` to its configured initial state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownView`] if `id` is not mounted.
    pub fn reset(&self, id: &str) -> Result<SliceChanges, RuntimeError> {
        self.dispatch(id, &ViewAction::Reset)
    }

    /// Unmounts `id` and saves its preferences.
    ///
    /// The view is removed even when saving fails.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownView`] if `id` is not mounted, or
    /// [`RuntimeError::Preferences`] if the preference store rejects the save.
    pub fn unmount(&self, id: &str) -> Result<(), RuntimeError> {
        let (_, handle) = self
            .views
            .remove(id)
            .ok_or_else(|| RuntimeError::UnknownView { id: id.to_string() })?;
        self.mount_order.write().retain(|mounted| mounted != id);

        handle.observer().on_unmount(id, &handle.snapshot());
        tracing::info!(view = %id, "view unmounted");

        if let Some(store) = self.persisting_store() {
            store.save(id, &handle.preferences())?;
        }
        Ok(())
    }

    /// Unmounts every view in reverse mount order. Save failures are logged.
    /// Returns the number of views unmounted.
    pub fn unmount_all(&self) -> usize {
        let order = self.mount_order.read().clone();
        let mut unmounted = 0;
        for id in order.iter().rev() {
            match self.unmount(id) {
                Ok(()) => unmounted += 1,
                Err(RuntimeError::UnknownView { .. }) => {}
                Err(err) => {
                    unmounted += 1;
                    tracing::warn!(view = %id, error = %err, "failed to save view preferences");
                }
            }
        }
        unmounted
    }

    /// Mounted view ids in mount order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.mount_order.read().clone()
    }

    /// Number of mounted views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` when no view is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn persisting_store(&self) -> Option<&Arc<dyn PreferenceStore>> {
        self.preferences
            .as_ref()
            .filter(|_| self.config.persist_preferences)
    }

    fn load_preferences(&self, id: &str) -> Option<ViewPreferences> {
        let store = self.persisting_store()?;
        match store.load(id) {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(view = %id, error = %err, "ignoring unreadable view preferences");
                None
            }
        }
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
