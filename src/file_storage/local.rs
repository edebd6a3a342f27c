//! # Local Filesystem Blob Store
//!
//! Blobs live under `<root>/<first two hex chars>/<uuid>`. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! sees a half-written payload.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use uuid::Uuid;

use super::backend::BlobStore;
use super::errors::{StorageError, StorageResult};

/// Local filesystem blob store
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a reference to a path, refusing anything we could not have issued
    fn full_path(&self, storage_ref: &str) -> StorageResult<PathBuf> {
        let (shard, name) = storage_ref
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidRef(storage_ref.to_string()))?;

        let id = Uuid::parse_str(name)
            .map_err(|_| StorageError::InvalidRef(storage_ref.to_string()))?;
        if shard != Self::shard_of(&id) || name != id.hyphenated().to_string() {
            return Err(StorageError::InvalidRef(storage_ref.to_string()));
        }

        Ok(self.root.join(shard).join(name))
    }

    fn shard_of(id: &Uuid) -> String {
        id.simple().to_string()[..2].to_string()
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, data: &[u8]) -> StorageResult<String> {
        let id = Uuid::new_v4();
        let storage_ref = format!("{}/{}", Self::shard_of(&id), id);
        let full_path = self.full_path(&storage_ref)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::IoError(e.to_string()))?;
        }

        let tmp_path = full_path.with_extension("partial");
        fs::write(&tmp_path, data).map_err(|e| StorageError::IoError(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp_path, &full_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::IoError(e.to_string()));
        }

        Ok(storage_ref)
    }

    fn get(&self, storage_ref: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(storage_ref)?;

        fs::read(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound(storage_ref.to_string())
            } else {
                StorageError::IoError(e.to_string())
            }
        })
    }

    fn delete(&self, storage_ref: &str) -> StorageResult<()> {
        let full_path = self.full_path(storage_ref)?;

        fs::remove_file(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound(storage_ref.to_string())
            } else {
                StorageError::IoError(e.to_string())
            }
        })
    }
}
