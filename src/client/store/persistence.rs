/**
 * Store Persistence
 *
 * Durable storage for the client store. Only the cart, the wishlist and the
 * pending-operation queue are written; the connectivity flag and user id are
 * session-derived.
 *
 * # Blob format
 *
 * A single namespaced, versioned JSON blob:
 * ```json
 * { "state": { "cart": [...], "wishlist": [...], "pendingOperations": [...] },
 *   "version": 1 }
 * ```
 *
 * # Migration
 *
 * `migrate` is keyed by the stored version. Version 0 blobs predate the
 * pending-operation queue and get an empty one. Blobs written by a newer
 * schema are refused rather than silently truncated.
 *
 * # Concurrency
 *
 * Two processes sharing one storage directory race on flush; the last
 * writer wins. `FileStorage` writes through a temp file and a rename so a
 * reader never observes a half-written blob.
 */
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::client::error::StoreError;
use crate::client::offline::queue::PendingQueue;
use crate::client::store::models::{CartItem, WishlistItem};
use crate::shared::SharedError;

/// Current persisted schema version
pub const STATE_VERSION: u32 = 1;

/// Key-value blob storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn save(&self, key: &str, blob: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process storage, lost on exit
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.blobs.write().await.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data-local-dir>/luxemarket`, if the platform has one
    pub fn default_dir() -> Option<PathBuf> {
        crate::shared::config::default_storage_dir()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The persisted subset of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
    #[serde(default)]
    pub pending_operations: PendingQueue,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Bring a stored state up to `STATE_VERSION`
pub fn migrate(mut state: serde_json::Value, version: u32) -> Result<serde_json::Value, StoreError> {
    if version > STATE_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            current: STATE_VERSION,
        });
    }
    if version == 0 {
        tracing::info!("Migrating persisted store from version 0 to {}", STATE_VERSION);
        if let Some(object) = state.as_object_mut() {
            object
                .entry("pendingOperations")
                .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        }
    }
    Ok(state)
}

/// Reads and writes the store blob through a `StorageBackend`
#[derive(Clone)]
pub struct StatePersistence {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl std::fmt::Debug for StatePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePersistence").field("key", &self.key).finish()
    }
}

impl StatePersistence {
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize the state into the versioned envelope
    pub fn encode(state: &PersistedState) -> Result<String, StoreError> {
        let envelope = Envelope {
            state,
            version: STATE_VERSION,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Parse and migrate a stored envelope
    pub fn decode(blob: &str) -> Result<PersistedState, StoreError> {
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(blob)?;
        let migrated = migrate(envelope.state, envelope.version)?;
        serde_json::from_value(migrated).map_err(|e| {
            StoreError::Shared(SharedError::serialization(format!(
                "persisted store is unreadable: {}",
                e
            )))
        })
    }

    /// Load the persisted state; `None` if nothing was stored yet
    pub async fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        match self.backend.load(&self.key).await? {
            Some(blob) => Self::decode(&blob).map(Some),
            None => Ok(None),
        }
    }

    pub async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let blob = Self::encode(state)?;
        self.backend.save(&self.key, &blob).await?;
        tracing::debug!(
            "Persisted store: {} cart line(s), {} wishlist item(s), {} pending operation(s)",
            state.cart.len(),
            state.wishlist.len(),
            state.pending_operations.len()
        );
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(&self.key).await
    }
}
