use crate::error::{AppError, Result};
use crate::ingestion::BulkImportState;
use crate::store::SyncStateStore;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Durable bulk-import state store backed by a Sled embedded database.
///
/// Guardrail state must survive restarts, otherwise every process start would
/// re-scan the external source in full.
#[derive(Clone)]
pub struct SledSyncStateStore {
    _db: Arc<Db>,
    tree: sled::Tree,
}

impl SledSyncStateStore {
    /// Open (or create) the state store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(&path)
            .map_err(|e| AppError::Internal(format!("Failed to open Sled database: {}", e)))?;

        let tree = db
            .open_tree("sync_state")
            .map_err(|e| AppError::Internal(format!("Failed to open sync_state tree: {}", e)))?;

        tracing::info!(path = ?path.as_ref(), "Initialized sync state store");

        Ok(Self {
            _db: Arc::new(db),
            tree,
        })
    }

    fn serialize_state(state: &BulkImportState) -> Result<Vec<u8>> {
        serde_json::to_vec(state)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize sync state: {}", e)))
    }

    fn deserialize_state(bytes: &[u8]) -> Result<BulkImportState> {
        serde_json::from_slice(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize sync state: {}", e))
        })
    }
}

#[async_trait]
impl SyncStateStore for SledSyncStateStore {
    async fn get(&self, source: &str) -> Result<Option<BulkImportState>> {
        let bytes = self
            .tree
            .get(source.as_bytes())
            .map_err(|e| AppError::RecordStore(format!("Failed to read sync state: {}", e)))?;

        bytes
            .map(|ivec| Self::deserialize_state(&ivec))
            .transpose()
    }

    async fn put(&self, state: &BulkImportState) -> Result<()> {
        let bytes = Self::serialize_state(state)?;
        self.tree
            .insert(state.source.as_bytes(), bytes)
            .map_err(|e| AppError::RecordStore(format!("Failed to write sync state: {}", e)))?;
        self.tree
            .flush_async()
            .await
            .map_err(|e| AppError::RecordStore(format!("Failed to flush sync state: {}", e)))?;

        tracing::debug!(source = %state.source, completed = state.completed, "Sync state persisted");
        Ok(())
    }
}
