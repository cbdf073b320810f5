//! Storage environment: one shared backend per storage type

use stashline_core::{StashlineResult, StorageBackend, StorageConfig, StorageType};
use std::sync::Arc;
use tracing::info;

use crate::memory::MemoryBackend;
use crate::persistent::SledBackend;

/// The pair of backends stores can be mirrored into.
///
/// Backends are shared by reference across every store created from
/// this environment. Two stores using the same key and storage type
/// write to the same slot; the last write wins.
#[derive(Clone)]
pub struct StorageEnvironment {
    local: Arc<dyn StorageBackend>,
    session: Arc<dyn StorageBackend>,
}

impl StorageEnvironment {
    pub fn new(local: Arc<dyn StorageBackend>, session: Arc<dyn StorageBackend>) -> Self {
        Self { local, session }
    }

    /// Durable local storage in `data_dir`, in-memory session storage
    pub fn open(config: &StorageConfig) -> StashlineResult<Self> {
        let (local, session) = open_backends(config)?;
        Ok(Self::new(local, session))
    }

    /// Both storage types held in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(MemoryBackend::new()))
    }

    pub fn backend(&self, storage_type: StorageType) -> Arc<dyn StorageBackend> {
        match storage_type {
            StorageType::Local => Arc::clone(&self.local),
            StorageType::Session => Arc::clone(&self.session),
        }
    }

    pub fn local(&self) -> Arc<dyn StorageBackend> {
        self.backend(StorageType::Local)
    }

    pub fn session(&self) -> Arc<dyn StorageBackend> {
        self.backend(StorageType::Session)
    }
}

/// Open the concrete backends described by `config`.
///
/// For callers that need operations beyond read and write, such as
/// removing a slot or listing keys. `StorageEnvironment::open` goes
/// through here too.
pub fn open_backends(
    config: &StorageConfig,
) -> StashlineResult<(Arc<SledBackend>, Arc<MemoryBackend>)> {
    std::fs::create_dir_all(&config.data_dir)?;

    let path = config.local_storage_path();
    let local = SledBackend::open(&path)?.flush_on_write(config.flush_on_write);
    let session = match config.session_quota_bytes {
        Some(quota) => MemoryBackend::with_quota(quota),
        None => MemoryBackend::new(),
    };

    info!("Opened local storage at {}", path.display());

    Ok((Arc::new(local), Arc::new(session)))
}

impl Default for StorageEnvironment {
    fn default() -> Self {
        Self::in_memory()
    }
}
