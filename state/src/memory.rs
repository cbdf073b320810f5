//! In-memory storage backend, the session-scoped medium

use dashmap::DashMap;
use parking_lot::Mutex;
use stashline_core::{StashlineError, StashlineResult, StorageBackend, StorageKey};

/// In-memory key-value store
///
/// Lives as long as the value itself. Optionally enforces a byte quota
/// counted over keys and values, the way web storage does.
pub struct MemoryBackend {
    data: DashMap<String, String>,
    quota_bytes: Option<usize>,
    // Serializes quota check and insert
    quota_lock: Mutex<()>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            quota_bytes: None,
            quota_lock: Mutex::new(()),
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            data: DashMap::new(),
            quota_bytes: Some(quota_bytes),
            quota_lock: Mutex::new(()),
        }
    }

    pub fn with_data<K, V>(data: Vec<(K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::new();
        for (key, value) in data {
            backend.data.insert(key.into(), value.into());
        }
        backend
    }

    pub fn remove(&self, key: &StorageKey) -> StashlineResult<()> {
        self.data.remove(key.as_str());
        Ok(())
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    pub fn keys(&self) -> Vec<StorageKey> {
        let mut keys: Vec<StorageKey> = self
            .data
            .iter()
            .map(|entry| StorageKey::new(entry.key().clone()))
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes currently held, keys included
    pub fn used_bytes(&self) -> usize {
        self.data
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &StorageKey) -> StashlineResult<Option<String>> {
        Ok(self.data.get(key.as_str()).map(|v| v.value().clone()))
    }

    fn write(&self, key: &StorageKey, value: &str) -> StashlineResult<()> {
        let Some(quota) = self.quota_bytes else {
            self.data.insert(key.as_str().to_string(), value.to_string());
            return Ok(());
        };

        let _guard = self.quota_lock.lock();
        let replaced = self
            .data
            .get(key.as_str())
            .map(|v| key.as_str().len() + v.value().len())
            .unwrap_or(0);
        let needed = self
            .used_bytes()
            .saturating_sub(replaced)
            .saturating_add(key.as_str().len() + value.len());
        if needed > quota {
            return Err(StashlineError::StorageUnavailable(format!(
                "quota exceeded: {} bytes needed, {} allowed",
                needed, quota
            )));
        }

        self.data.insert(key.as_str().to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_memory_backend_basic() {
        let backend = MemoryBackend::new();
        let key = StorageKey::from("key1");

        assert_eq!(backend.read(&key).unwrap(), None);

        backend.write(&key, "value1").unwrap();
        assert_eq!(backend.read(&key).unwrap(), Some("value1".to_string()));

        backend.remove(&key).unwrap();
        assert_eq!(backend.read(&key).unwrap(), None);
    }

    #[test]
    fn test_memory_backend_keys_sorted() {
        let backend = MemoryBackend::with_data(vec![("b", "2"), ("a", "1")]);
        let keys: Vec<String> = backend.keys().into_iter().map(|k| k.0).collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(backend.len(), 2);

        backend.clear();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_memory_backend_quota() {
        let backend = MemoryBackend::with_quota(10);
        let key = StorageKey::from("k");

        backend.write(&key, "123456789").unwrap();
        assert_eq!(backend.used_bytes(), 10);

        // Replacing the same slot only counts the new value
        backend.write(&key, "abcdefghi").unwrap();

        let err = backend.write(&key, "0123456789").unwrap_err();
        assert!(matches!(err, StashlineError::StorageUnavailable(_)));
        assert_eq!(backend.read(&key).unwrap(), Some("abcdefghi".to_string()));
    }

    #[test]
    fn test_memory_backend_quota_under_concurrent_writers() {
        let backend = Arc::new(MemoryBackend::with_quota(64));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    let key = StorageKey::new(format!("k{}", i));
                    for round in 0..200 {
                        let value = "x".repeat(round % 12);
                        let _ = backend.write(&key, &value);
                        if round % 7 == 0 {
                            backend.remove(&key).unwrap();
                        }
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        assert!(backend.used_bytes() <= 64);
    }
}
