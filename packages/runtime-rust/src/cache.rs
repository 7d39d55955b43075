//! Introspection cache keyed by schema identity.
//!
//! Introspection is deterministic, so a schema shared through an `Arc` only
//! needs to be walked once. Entries hold a `Weak` to their schema: once the
//! last `Arc` is dropped the entry is stale and is recomputed or purged.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use schemaview_core::{introspect, SchemaDefinition, SchemaNode};

struct Entry {
    owner: Weak<dyn Any + Send + Sync>,
    definition: Arc<SchemaDefinition>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// Hit and miss counters of a [`SchemaCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Shared cache of [`SchemaDefinition`]s.
#[derive(Default)]
pub struct SchemaCache {
    entries: DashMap<usize, Entry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached definition of `schema`, introspecting it on first use.
    pub fn definition<S>(&self, schema: &Arc<S>) -> Arc<SchemaDefinition>
    where
        S: SchemaNode + Send + Sync + 'static,
    {
        self.get_or_introspect(schema, introspect::<S>)
    }

    /// Cached definition of `source`, computed by `describe` on first use.
    ///
    /// For sources that are not schema nodes themselves, e.g. a JSON Schema
    /// document wrapped by an adapter inside `describe`.
    pub fn get_or_introspect<T, F>(&self, source: &Arc<T>, describe: F) -> Arc<SchemaDefinition>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> SchemaDefinition,
    {
        let key = Arc::as_ptr(source).cast::<()>() as usize;
        if let Some(entry) = self.entries.get(&key) {
            if entry.is_live() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Arc::clone(&entry.definition);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let definition = Arc::new(describe(source));
        tracing::debug!(
            schema = %definition.name,
            fields = definition.fields.len(),
            "introspected schema"
        );
        let weak: Weak<T> = Arc::downgrade(source);
        let owner: Weak<dyn Any + Send + Sync> = weak;
        self.entries.insert(
            key,
            Entry {
                owner,
                definition: Arc::clone(&definition),
            },
        );
        definition
    }

    /// Drops entries whose schema is gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live());
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
