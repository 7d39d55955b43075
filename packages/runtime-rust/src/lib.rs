//! `SchemaView` Runtime: mounted views with snapshot reads, observers and
//! preference persistence on top of `schemaview-core`.

pub mod cache;
pub mod config;
pub mod error;
pub mod handle;
pub mod observer;
pub mod preferences;
pub mod registry;
pub mod telemetry;

pub use cache::{CacheStats, SchemaCache};
pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use handle::ViewHandle;
pub use observer::{ChangeCause, CompositeViewObserver, ViewChange, ViewObserver};
pub use preferences::{MemoryPreferenceStore, NullPreferenceStore, PreferenceStore, ViewPreferences};
pub use registry::ViewRegistry;
pub use telemetry::{init_tracing, LogFormat};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
