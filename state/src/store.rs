//! Persistent state store: hydration and write-through
//!
//! A store starts `Cold`, exposing its initial value. A hydration task is
//! handed to a `Scheduler` at construction; when it runs it reads the
//! slot once and flips the store to `Hydrated`. From then on every update
//! is written through to the backend.
//!
//! Ordering between hydration and early updates: every update bumps a
//! revision counter, and hydration only applies the stored value while
//! that counter is still zero. Hydration therefore wins only if it runs
//! before the first `set_state`; otherwise the in-memory value stands.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use stashline_core::{
    ErrorReporter, FailureKind, HydrationStatus, Serializer, StashlineResult, StorageBackend,
    StorageKey, StorageType, StoreConfig, StoreFailure,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::environment::StorageEnvironment;
use crate::report::TracingReporter;
use crate::scheduler::Scheduler;
use crate::serializer::JsonSerializer;

/// An update to apply to a store's value
pub enum SetStateAction<T> {
    /// Replace the value outright
    Replace(T),
    /// Compute the next value from the current one
    Update(Box<dyn FnOnce(&T) -> T>),
}

impl<T> SetStateAction<T> {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + 'static,
    {
        SetStateAction::Update(Box::new(f))
    }

    fn resolve(self, current: &T) -> T {
        match self {
            SetStateAction::Replace(value) => value,
            SetStateAction::Update(f) => f(current),
        }
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        SetStateAction::Replace(value)
    }
}

/// Shared state behind every `StoreHandle`
pub struct PersistentStateStore<T> {
    key: StorageKey,
    storage_type: StorageType,
    value: RwLock<T>,
    revision: AtomicU64,
    hydration_started: AtomicBool,
    status: watch::Sender<HydrationStatus>,
    backend: Arc<dyn StorageBackend>,
    serializer: Arc<dyn Serializer<T>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl<T> PersistentStateStore<T> {
    fn status(&self) -> HydrationStatus {
        *self.status.borrow()
    }

    fn report(&self, kind: FailureKind, error: stashline_core::StashlineError) {
        self.reporter
            .report(StoreFailure::new(kind, self.key.clone(), error));
    }

    /// One-time read from storage. Re-entry is a no-op.
    fn hydrate(&self) {
        if self.hydration_started.swap(true, Ordering::AcqRel) {
            return;
        }

        let stored = match self.backend.read(&self.key) {
            Ok(Some(text)) if !text.is_empty() => match self.serializer.decode(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.report(FailureKind::DecodeFailure, e);
                    None
                }
            },
            Ok(_) => {
                debug!(key = %self.key, "No stored state, keeping initial value");
                None
            }
            Err(e) => {
                self.report(FailureKind::ReadFailure, e);
                None
            }
        };

        let mut value = self.value.write();
        if let Some(stored) = stored {
            if self.revision.load(Ordering::Acquire) == 0 {
                *value = stored;
                debug!(key = %self.key, storage = %self.storage_type, "Hydrated state from storage");
            } else {
                warn!(
                    key = %self.key,
                    "State was updated before hydration ran, ignoring stored value"
                );
            }
        }
        self.status.send_replace(HydrationStatus::Hydrated);
    }

    fn persist(&self, value: &T) {
        let result = self
            .serializer
            .encode(value)
            .and_then(|text| self.backend.write(&self.key, &text));

        match result {
            Ok(()) => debug!(key = %self.key, "Wrote state through to storage"),
            Err(e) => self.report(FailureKind::WriteFailure, e),
        }
    }

    fn apply<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        // Held across the write-through so persisted order matches update order
        let mut value = self.value.write();
        *value = f(&*value);
        self.revision.fetch_add(1, Ordering::AcqRel);

        if self.status().is_hydrated() {
            self.persist(&*value);
        } else {
            debug!(key = %self.key, "Store not hydrated yet, skipping write-through");
        }
    }
}

/// Handle to a persistent store
///
/// Cheap to clone; all clones share one value and one hydration status.
/// Update closures run while the store is locked and must not call back
/// into the same store.
pub struct StoreHandle<T> {
    inner: Arc<PersistentStateStore<T>>,
}

impl<T> Clone for StoreHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> StoreHandle<T> {
    /// Current in-memory value, available at any hydration status
    pub fn get_state(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.read().clone()
    }

    /// Read the value without cloning it
    pub fn with_state<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.read())
    }

    pub fn set_state(&self, action: impl Into<SetStateAction<T>>) {
        let action = action.into();
        self.inner.apply(move |current| action.resolve(current));
    }

    pub fn set(&self, value: T) {
        self.inner.apply(move |_| value);
    }

    /// Functional update resolved against the value current at application time
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.inner.apply(f);
    }

    pub fn status(&self) -> HydrationStatus {
        self.inner.status()
    }

    pub fn is_hydrated(&self) -> bool {
        self.status().is_hydrated()
    }

    /// Resolves once the hydration task has run
    pub async fn wait_hydrated(&self) {
        let mut rx = self.inner.status.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|status| status.is_hydrated()).await;
    }

    pub fn key(&self) -> &StorageKey {
        &self.inner.key
    }

    pub fn storage_type(&self) -> StorageType {
        self.inner.storage_type
    }
}

impl<T> fmt::Debug for StoreHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("key", &self.inner.key)
            .field("storage_type", &self.inner.storage_type)
            .field("status", &self.status())
            .finish()
    }
}

/// Builder for stores that need a non-default serializer, reporter or backend
pub struct StoreBuilder<T> {
    config: StoreConfig<T>,
    serializer: Arc<dyn Serializer<T>>,
    reporter: Arc<dyn ErrorReporter>,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl<T> StoreBuilder<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: StoreConfig<T>) -> Self {
        Self::with_serializer(config, Arc::new(JsonSerializer))
    }
}

impl<T> StoreBuilder<T>
where
    T: Send + Sync + 'static,
{
    pub fn with_serializer(config: StoreConfig<T>, serializer: Arc<dyn Serializer<T>>) -> Self {
        Self {
            config,
            serializer,
            reporter: Arc::new(TracingReporter),
            backend: None,
        }
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Bypass the environment and mirror into this backend instead
    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Create the store and schedule its hydration.
    ///
    /// Returns immediately with the initial value in place.
    pub fn initialize<S>(self, env: &StorageEnvironment, scheduler: &S) -> StashlineResult<StoreHandle<T>>
    where
        S: Scheduler + ?Sized,
    {
        self.config.validate()?;

        let StoreConfig {
            storage_key,
            storage_type,
            initial_state,
        } = self.config;
        let backend = self
            .backend
            .unwrap_or_else(|| env.backend(storage_type));
        let (status, _) = watch::channel(HydrationStatus::Cold);

        let inner = Arc::new(PersistentStateStore {
            key: storage_key,
            storage_type,
            value: RwLock::new(initial_state),
            revision: AtomicU64::new(0),
            hydration_started: AtomicBool::new(false),
            status,
            backend,
            serializer: self.serializer,
            reporter: self.reporter,
        });

        let task_inner = Arc::clone(&inner);
        scheduler.schedule(Box::new(move || task_inner.hydrate()));

        debug!(key = %inner.key, storage = %inner.storage_type, "Store initialized, hydration scheduled");

        Ok(StoreHandle { inner })
    }
}

/// Create a JSON-backed store that logs failures through `tracing`
pub fn initialize<T, S>(
    config: StoreConfig<T>,
    env: &StorageEnvironment,
    scheduler: &S,
) -> StashlineResult<StoreHandle<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Scheduler + ?Sized,
{
    StoreBuilder::new(config).initialize(env, scheduler)
}
