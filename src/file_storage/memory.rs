//! # In-Memory Blob Store

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::backend::BlobStore;
use super::errors::{StorageError, StorageResult};

/// Blob store backed by a map, for tests and ephemeral servers
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, data: &[u8]) -> StorageResult<String> {
        let storage_ref = Uuid::new_v4().to_string();
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StorageError::Internal("Lock poisoned".to_string()))?;
        blobs.insert(storage_ref.clone(), data.to_vec());
        Ok(storage_ref)
    }

    fn get(&self, storage_ref: &str) -> StorageResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| StorageError::Internal("Lock poisoned".to_string()))?;
        blobs
            .get(storage_ref)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound(storage_ref.to_string()))
    }

    fn delete(&self, storage_ref: &str) -> StorageResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StorageError::Internal("Lock poisoned".to_string()))?;
        blobs
            .remove(storage_ref)
            .map(|_| ())
            .ok_or_else(|| StorageError::ObjectNotFound(storage_ref.to_string()))
    }
}
