//! Core traits defining Stashline interfaces
//!
//! These traits are the seams between the state engine and the
//! environment it persists into.

use crate::types::{StorageKey, StoreFailure};

/// Result type for Stashline operations
pub type StashlineResult<T> = Result<T, crate::error::StashlineError>;

/// Durable key-value medium a store is mirrored into.
///
/// Failures of the underlying medium (disabled, full, otherwise
/// inaccessible) are returned as `StashlineError::StorageUnavailable`,
/// never swallowed at this layer.
pub trait StorageBackend: Send + Sync {
    /// Read the text stored at `key`, if any
    fn read(&self, key: &StorageKey) -> StashlineResult<Option<String>>;

    /// Replace the text stored at `key`
    fn write(&self, key: &StorageKey, value: &str) -> StashlineResult<()>;
}

/// Converts state values to and from their stored text form.
///
/// Anything that passed `encode` must come back from `decode` as an
/// equal value.
pub trait Serializer<T>: Send + Sync {
    fn encode(&self, value: &T) -> StashlineResult<String>;

    fn decode(&self, text: &str) -> StashlineResult<T>;
}

/// Hook receiving failures that a store recovers from locally
pub trait ErrorReporter: Send + Sync {
    fn report(&self, failure: StoreFailure);
}
