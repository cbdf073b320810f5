//! Reporting hooks for failures a store recovers from

use parking_lot::Mutex;
use stashline_core::{ErrorReporter, FailureKind, StoreFailure};
use std::sync::Arc;
use tracing::error;

/// Logs every failure through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, failure: StoreFailure) {
        let key = failure.key_str();
        let kind = failure.kind;
        let error = &failure.error;
        match kind {
            FailureKind::ReadFailure | FailureKind::DecodeFailure => {
                error!(key, %kind, "Error retrieving state from storage: {}", error);
            }
            FailureKind::WriteFailure => {
                error!(key, %kind, "Error storing state: {}", error);
            }
            FailureKind::UsageError => {
                error!(key, %kind, "{}", error);
            }
        }
    }
}

/// Discards every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _failure: StoreFailure) {}
}

/// Keeps failures in memory so they can be inspected later
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<StoreFailure>>,
}

impl CollectingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<FailureKind> {
        self.failures.lock().iter().map(|f| f.kind).collect()
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures.lock().iter().filter(|f| f.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.lock().is_empty()
    }

    pub fn take(&self) -> Vec<StoreFailure> {
        std::mem::take(&mut *self.failures.lock())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, failure: StoreFailure) {
        self.failures.lock().push(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stashline_core::{StashlineError, StorageKey};

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        assert!(reporter.is_empty());

        reporter.report(StoreFailure::new(
            FailureKind::ReadFailure,
            StorageKey::default(),
            StashlineError::StorageUnavailable("disabled".into()),
        ));
        reporter.report(StoreFailure::new(
            FailureKind::WriteFailure,
            StorageKey::default(),
            StashlineError::StorageUnavailable("full".into()),
        ));

        assert_eq!(
            reporter.kinds(),
            vec![FailureKind::ReadFailure, FailureKind::WriteFailure]
        );
        assert_eq!(reporter.count(FailureKind::WriteFailure), 1);

        let taken = reporter.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].key_str(), Some("persistent-context"));
        assert!(reporter.is_empty());
    }
}
