//! Configuration types for Stashline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::StashlineError;
use crate::traits::StashlineResult;
use crate::types::{StorageKey, StorageType};

/// Per-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig<T> {
    /// Slot in the backing store
    pub storage_key: StorageKey,

    /// Which storage medium to mirror into
    pub storage_type: StorageType,

    /// Value exposed until hydration replaces it
    pub initial_state: T,
}

impl<T> StoreConfig<T> {
    pub fn new(initial_state: T) -> Self {
        Self {
            storage_key: StorageKey::default(),
            storage_type: StorageType::default(),
            initial_state,
        }
    }

    pub fn with_key(mut self, key: impl Into<StorageKey>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    pub fn with_initial_state(mut self, initial_state: T) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn validate(&self) -> StashlineResult<()> {
        if self.storage_key.is_empty() {
            return Err(StashlineError::ConfigError(
                "storage key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl<T: Default> Default for StoreConfig<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Storage environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the durable (local) store
    pub data_dir: PathBuf,

    /// Flush the durable store to disk after every write
    pub flush_on_write: bool,

    /// Byte limit for the session store, unlimited when absent
    pub session_quota_bytes: Option<usize>,

    /// Logging level
    pub log_level: String,
}

impl StorageConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> StashlineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StashlineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            StashlineError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Location of the sled database backing local storage
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join("local-storage")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|dir| dir.join("stashline"))
            .unwrap_or_else(|| PathBuf::from("./data"));

        Self {
            data_dir,
            flush_on_write: true,
            session_quota_bytes: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_defaults() {
        let config: StoreConfig<serde_json::Map<String, serde_json::Value>> = StoreConfig::default();
        assert_eq!(config.storage_key.as_str(), "persistent-context");
        assert_eq!(config.storage_type, StorageType::Local);
        assert!(config.initial_state.is_empty());
    }

    #[test]
    fn test_store_config_rejects_empty_key() {
        let config = StoreConfig::new(0u32).with_key("");
        assert!(matches!(config.validate(), Err(StashlineError::ConfigError(_))));
    }

    #[test]
    fn test_storage_config_partial_json() {
        let config: StorageConfig =
            serde_json::from_str(r#"{ "data_dir": "/tmp/stash", "flush_on_write": false }"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/stash"));
        assert!(!config.flush_on_write);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.local_storage_path(), PathBuf::from("/tmp/stash/local-storage"));
    }
}
