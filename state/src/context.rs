//! Boundary between a composition root and code that expects a store
//!
//! Code holding a `StoreHandle` can never observe an uninitialized store.
//! A binding layer that looks stores up instead goes through a
//! `StoreContext`, where the absence of a provider becomes a `UsageError`.

use parking_lot::RwLock;
use stashline_core::{
    ErrorReporter, FailureKind, StashlineError, StashlineResult, StoreFailure,
};
use std::sync::Arc;

use crate::store::{SetStateAction, StoreHandle};

const MISSING_PROVIDER: &str = "store accessed outside of an initialized provider";

/// Slot that may or may not hold an initialized store
pub struct StoreContext<T> {
    handle: RwLock<Option<StoreHandle<T>>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl<T> StoreContext<T> {
    /// A context with no provider in scope
    pub fn empty() -> Self {
        Self {
            handle: RwLock::new(None),
            reporter: None,
        }
    }

    pub fn with_handle(handle: StoreHandle<T>) -> Self {
        let context = Self::empty();
        context.provide(handle);
        context
    }

    /// Report usage errors through this hook as well as returning them
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Install a handle, returning the one it replaces
    pub fn provide(&self, handle: StoreHandle<T>) -> Option<StoreHandle<T>> {
        self.handle.write().replace(handle)
    }

    /// Remove the handle, as when the providing scope ends
    pub fn withdraw(&self) -> Option<StoreHandle<T>> {
        self.handle.write().take()
    }

    pub fn is_provided(&self) -> bool {
        self.handle.read().is_some()
    }

    pub fn use_store(&self) -> StashlineResult<StoreHandle<T>> {
        match self.handle.read().as_ref() {
            Some(handle) => Ok(handle.clone()),
            None => Err(self.usage_error()),
        }
    }

    pub fn get_state(&self) -> StashlineResult<T>
    where
        T: Clone,
    {
        self.use_store().map(|store| store.get_state())
    }

    pub fn set_state(&self, action: impl Into<SetStateAction<T>>) -> StashlineResult<()> {
        let store = self.use_store()?;
        store.set_state(action);
        Ok(())
    }

    pub fn is_hydrated(&self) -> StashlineResult<bool> {
        self.use_store().map(|store| store.is_hydrated())
    }

    fn usage_error(&self) -> StashlineError {
        if let Some(reporter) = &self.reporter {
            reporter.report(StoreFailure::unbound(
                FailureKind::UsageError,
                StashlineError::UsageError(MISSING_PROVIDER.to_string()),
            ));
        }
        StashlineError::UsageError(MISSING_PROVIDER.to_string())
    }
}

impl<T> Default for StoreContext<T> {
    fn default() -> Self {
        Self::empty()
    }
}
