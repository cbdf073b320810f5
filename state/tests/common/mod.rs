//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use stashline_core::{StashlineError, StashlineResult, StorageBackend, StorageKey};
use stashline_state::MemoryBackend;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// State shape used across the scenarios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl TestState {
    pub fn user(name: &str) -> Self {
        Self {
            user: Some(name.to_string()),
            count: None,
        }
    }

    pub fn count(count: u32) -> Self {
        Self {
            user: None,
            count: Some(count),
        }
    }
}

/// Memory backend that can be told to fail and counts calls
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads() -> Self {
        let backend = Self::new();
        backend.fail_reads.store(true, Ordering::SeqCst);
        backend
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.inner
            .write(&StorageKey::from(key), value)
            .expect("seeding memory backend");
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.inner
            .read(&StorageKey::from(key))
            .expect("reading memory backend")
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StorageBackend for FlakyBackend {
    fn read(&self, key: &StorageKey) -> StashlineResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StashlineError::StorageUnavailable("Storage error".into()));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &StorageKey, value: &str) -> StashlineResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StashlineError::StorageUnavailable("Storage error".into()));
        }
        self.inner.write(key, value)
    }
}
