//! Durable storage backend using sled database

use sled::{Db, Tree};
use stashline_core::{StashlineError, StashlineResult, StorageBackend, StorageKey};
use std::path::Path;

const LOCAL_STORAGE_TREE: &str = "local_storage";

fn storage_error(e: sled::Error) -> StashlineError {
    StashlineError::StorageUnavailable(e.to_string())
}

/// Durable key-value store backed by a sled tree
pub struct SledBackend {
    db: Db,
    entries: Tree,
    flush_on_write: bool,
}

impl SledBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> StashlineResult<Self> {
        let db = sled::open(path).map_err(storage_error)?;
        Self::from_db(db)
    }

    /// Open a throwaway database that is removed when dropped
    pub fn temporary() -> StashlineResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_error)?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StashlineResult<Self> {
        let entries = db.open_tree(LOCAL_STORAGE_TREE).map_err(storage_error)?;
        Ok(Self {
            db,
            entries,
            flush_on_write: false,
        })
    }

    pub fn flush_on_write(mut self, enabled: bool) -> Self {
        self.flush_on_write = enabled;
        self
    }

    pub fn remove(&self, key: &StorageKey) -> StashlineResult<()> {
        self.entries.remove(key.as_str()).map_err(storage_error)?;
        if self.flush_on_write {
            self.flush()?;
        }
        Ok(())
    }

    pub fn clear(&self) -> StashlineResult<()> {
        self.entries.clear().map_err(storage_error)?;
        self.flush()
    }

    pub fn keys(&self) -> StashlineResult<Vec<StorageKey>> {
        self.entries
            .iter()
            .keys()
            .map(|result| {
                let key = result.map_err(storage_error)?;
                String::from_utf8(key.to_vec())
                    .map(StorageKey::new)
                    .map_err(|e| StashlineError::StorageUnavailable(e.to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flush(&self) -> StashlineResult<()> {
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }
}

impl StorageBackend for SledBackend {
    fn read(&self, key: &StorageKey) -> StashlineResult<Option<String>> {
        match self.entries.get(key.as_str()).map_err(storage_error)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| {
                    StashlineError::StorageUnavailable(format!(
                        "stored bytes at '{}' are not UTF-8: {}",
                        key, e
                    ))
                }),
            None => Ok(None),
        }
    }

    fn write(&self, key: &StorageKey, value: &str) -> StashlineResult<()> {
        self.entries
            .insert(key.as_str(), value.as_bytes())
            .map_err(storage_error)?;
        if self.flush_on_write {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    // sled drops its file lock from a background thread, so a reopen right
    // after drop can briefly see the old lock
    fn reopen(path: &Path) -> SledBackend {
        let mut attempts = 0;
        loop {
            match SledBackend::open(path) {
                Ok(backend) => return backend,
                Err(_) if attempts < 50 => {
                    attempts += 1;
                    thread::sleep(Duration::from_millis(20));
                }
                Err(e) => panic!("could not reopen sled database: {}", e),
            }
        }
    }

    #[test]
    fn test_sled_backend_basic() {
        let tmp = TempDir::new().unwrap();
        let backend = SledBackend::open(tmp.path()).unwrap();
        let key = StorageKey::from("key1");

        backend.write(&key, "value1").unwrap();
        assert_eq!(backend.read(&key).unwrap(), Some("value1".to_string()));

        backend.remove(&key).unwrap();
        assert_eq!(backend.read(&key).unwrap(), None);
    }

    #[test]
    fn test_sled_backend_reopen() {
        let tmp = TempDir::new().unwrap();
        let key = StorageKey::from("persistent-context");

        {
            let backend = SledBackend::open(tmp.path()).unwrap().flush_on_write(true);
            backend.write(&key, r#"{"count":2}"#).unwrap();
        }

        {
            let backend = reopen(tmp.path());
            assert_eq!(backend.read(&key).unwrap(), Some(r#"{"count":2}"#.to_string()));
            assert_eq!(backend.len(), 1);
        }
    }

    #[test]
    fn test_sled_backend_keys() {
        let backend = SledBackend::temporary().unwrap();
        backend.write(&StorageKey::from("b"), "2").unwrap();
        backend.write(&StorageKey::from("a"), "1").unwrap();

        let keys: Vec<String> = backend.keys().unwrap().into_iter().map(|k| k.0).collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        backend.clear().unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_sled_backend_rejects_non_utf8() {
        let backend = SledBackend::temporary().unwrap();
        backend.entries.insert("raw", &[0xffu8, 0xfe][..]).unwrap();

        let err = backend.read(&StorageKey::from("raw")).unwrap_err();
        assert!(matches!(err, StashlineError::StorageUnavailable(_)));
    }
}
