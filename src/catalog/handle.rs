//! Shared, hot-reloadable access to the current catalog snapshot.
//!
//! The handle stores an `Arc` to the published snapshot. Readers clone the
//! `Arc` and keep scoring against it for as long as they need, so a reload
//! never changes the catalog underneath an in-flight call. Publishing swaps
//! the whole reference under a short write lock: readers see the old catalog
//! or the new one, never a mix.

use super::snapshot::CohortCatalogSnapshot;
use super::source::CatalogSource;
use crate::errors::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

type ReloadListener = Arc<dyn Fn(&Arc<CohortCatalogSnapshot>) + Send + Sync>;

pub struct CatalogHandle {
    source: Box<dyn CatalogSource>,
    current: RwLock<Option<Arc<CohortCatalogSnapshot>>>,
    listeners: Mutex<Vec<ReloadListener>>,
}

impl CatalogHandle {
    /// Create a handle with nothing published yet.
    ///
    /// Scoring against it fails with `CatalogUnavailable` until `reload`
    /// succeeds.
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            current: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Create a handle and perform the initial load.
    pub fn load(source: impl CatalogSource + 'static) -> Result<Self> {
        let handle = Self::new(source);
        handle.reload()?;
        Ok(handle)
    }

    /// Create a handle around an already built snapshot.
    ///
    /// Reloading re-publishes the same snapshot.
    pub fn from_snapshot(snapshot: CohortCatalogSnapshot) -> Self {
        let snapshot = Arc::new(snapshot);
        let handle = Self::new(FixedSource(Arc::clone(&snapshot)));
        *handle.current.write() = Some(snapshot);
        handle
    }

    /// The snapshot published at the time of the call.
    pub fn snapshot(&self) -> Result<Arc<CohortCatalogSnapshot>> {
        self.current.read().clone().ok_or_else(|| {
            Error::CatalogUnavailable(format!(
                "no catalog has been loaded from {}",
                self.source.describe()
            ))
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn version(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .map(|s| s.version().to_string())
    }

    /// Build a fresh snapshot from the source and publish it.
    ///
    /// On failure the previously published snapshot stays in place and the
    /// error is returned to the caller.
    pub fn reload(&self) -> Result<Arc<CohortCatalogSnapshot>> {
        match self.source.load_catalog() {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Catalog reload failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Atomically replace the published snapshot and notify listeners.
    pub fn publish(&self, snapshot: CohortCatalogSnapshot) -> Arc<CohortCatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        let previous = self.current.write().replace(Arc::clone(&snapshot));

        info!(
            version = snapshot.version(),
            previous = previous.as_ref().map(|p| p.version()).unwrap_or("none"),
            cohorts = snapshot.len(),
            "Published cohort catalog"
        );

        // Listeners run unlocked so they may register further listeners
        let listeners: Vec<ReloadListener> = self.listeners.lock().clone();
        for listener in &listeners {
            listener(&snapshot);
        }
        snapshot
    }

    /// Register a callback invoked after every successful publish.
    pub fn on_reload<F>(&self, callback: F)
    where
        F: Fn(&Arc<CohortCatalogSnapshot>) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(callback));
    }
}

impl std::fmt::Debug for CatalogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogHandle")
            .field("source", &self.source.describe())
            .field("version", &self.version())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

struct FixedSource(Arc<CohortCatalogSnapshot>);

impl CatalogSource for FixedSource {
    fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
        Ok(self.0.as_ref().clone())
    }

    fn describe(&self) -> String {
        format!("fixed snapshot {}", self.0.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::{BuiltinSource, StaticSource, BUILTIN_CATALOG_JSON};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unloaded_handle_reports_catalog_unavailable() {
        let handle = CatalogHandle::new(StaticSource::new("{}"));
        let err = handle.snapshot().unwrap_err();
        assert!(matches!(err, Error::CatalogUnavailable(_)));
        assert!(!handle.is_loaded());
    }

    struct SwitchableSource(Mutex<String>);

    impl CatalogSource for SwitchableSource {
        fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
            CohortCatalogSnapshot::from_json(&self.0.lock())
        }

        fn describe(&self) -> String {
            "switchable".to_string()
        }
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let source = Arc::new(SwitchableSource(Mutex::new(BUILTIN_CATALOG_JSON.to_string())));
        let handle = CatalogHandle::load(SharedSource(Arc::clone(&source))).unwrap();
        let before = handle.snapshot().unwrap();

        *source.0.lock() = "{ broken".to_string();
        assert!(handle.reload().is_err());

        assert_eq!(*handle.snapshot().unwrap(), *before);
    }

    struct SharedSource(Arc<SwitchableSource>);

    impl CatalogSource for SharedSource {
        fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
            self.0.load_catalog()
        }

        fn describe(&self) -> String {
            self.0.describe()
        }
    }

    #[test]
    fn listeners_fire_on_publish() {
        let handle = CatalogHandle::new(StaticSource::new(BUILTIN_CATALOG_JSON));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        handle.on_reload(move |snapshot| {
            assert!(!snapshot.is_empty());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handle.reload().unwrap();
        handle.reload().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn held_snapshot_survives_swap() {
        let handle = CatalogHandle::load(BuiltinSource).unwrap();
        let held = handle.snapshot().unwrap();

        let mut document = held.to_document();
        document.metadata.version = "next".to_string();
        handle.publish(CohortCatalogSnapshot::from_document(document).unwrap());

        assert_ne!(held.version(), "next");
        assert_eq!(handle.version().as_deref(), Some("next"));
    }

    #[test]
    fn listener_can_register_another_listener() {
        let handle = Arc::new(CatalogHandle::new(BuiltinSource));
        let weak = Arc::downgrade(&handle);
        let nested_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&nested_calls);
        handle.on_reload(move |_| {
            if let Some(handle) = weak.upgrade() {
                let counter = Arc::clone(&counter);
                handle.on_reload(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        handle.reload().unwrap();
        assert_eq!(nested_calls.load(Ordering::SeqCst), 0);
        handle.reload().unwrap();
        assert_eq!(nested_calls.load(Ordering::SeqCst), 1);
    }
}
