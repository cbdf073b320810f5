//! Core types for Stashline
//!
//! Defines the vocabulary shared by the storage backends and the state engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StashlineError;

/// Key used when a store is created without an explicit one
pub const DEFAULT_STORAGE_KEY: &str = "persistent-context";

/// Slot identifier in the backing store
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(pub String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        StorageKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        StorageKey(DEFAULT_STORAGE_KEY.to_string())
    }
}

impl From<&str> for StorageKey {
    fn from(key: &str) -> Self {
        StorageKey(key.to_string())
    }
}

impl From<String> for StorageKey {
    fn from(key: String) -> Self {
        StorageKey(key)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({:?})", self.0)
    }
}

/// Which storage medium a store is mirrored into
///
/// `Local` survives process restarts, `Session` lives as long as the
/// storage environment that owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StorageType {
    #[default]
    #[serde(rename = "localStorage", alias = "local")]
    Local,
    #[serde(rename = "sessionStorage", alias = "session")]
    Session,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Local => "localStorage",
            StorageType::Session => "sessionStorage",
        }
    }
}

impl FromStr for StorageType {
    type Err = StashlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localStorage" | "local" => Ok(StorageType::Local),
            "sessionStorage" | "session" => Ok(StorageType::Session),
            other => Err(StashlineError::ConfigError(format!(
                "unknown storage type '{}', expected localStorage or sessionStorage",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageType({})", self.as_str())
    }
}

/// Whether a store has attempted its one-time read from storage.
///
/// Monotonic: once `Hydrated`, a store never goes back to `Cold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HydrationStatus {
    /// No read attempted yet
    #[default]
    Cold,
    /// Read attempted, regardless of outcome
    Hydrated,
}

impl HydrationStatus {
    pub fn is_hydrated(&self) -> bool {
        matches!(self, HydrationStatus::Hydrated)
    }
}

impl fmt::Display for HydrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationStatus::Cold => f.write_str("cold"),
            HydrationStatus::Hydrated => f.write_str("hydrated"),
        }
    }
}

/// Distinguishable kind of a failure handed to a reporting hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Backend inaccessible during the hydration read
    ReadFailure,
    /// Stored text is malformed or does not decode as the state type
    DecodeFailure,
    /// Encoding failed or the backend rejected a write
    WriteFailure,
    /// A store was used without ever being initialized
    UsageError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ReadFailure => "read failure",
            FailureKind::DecodeFailure => "decode failure",
            FailureKind::WriteFailure => "write failure",
            FailureKind::UsageError => "usage error",
        };
        f.write_str(name)
    }
}

/// A failure observed by a store, as passed to an `ErrorReporter`
///
/// `key` is `None` when no store was in scope to attribute the failure to.
#[derive(Debug)]
pub struct StoreFailure {
    pub kind: FailureKind,
    pub key: Option<StorageKey>,
    pub error: StashlineError,
}

impl StoreFailure {
    pub fn new(kind: FailureKind, key: StorageKey, error: StashlineError) -> Self {
        Self {
            kind,
            key: Some(key),
            error,
        }
    }

    /// A failure not tied to any storage slot
    pub fn unbound(kind: FailureKind, error: StashlineError) -> Self {
        Self {
            kind,
            key: None,
            error,
        }
    }

    pub fn key_str(&self) -> Option<&str> {
        self.key.as_ref().map(StorageKey::as_str)
    }
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} for key '{}': {}", self.kind, key, self.error),
            None => write!(f, "{}: {}", self.kind, self.error),
        }
    }
}
