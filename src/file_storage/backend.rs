//! # Blob Store Trait

use super::errors::StorageResult;

/// Physical payload storage
///
/// The returned storage reference is opaque to every caller; only the
/// backend that produced it may interpret it.
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Store bytes and return a reference to them
    fn put(&self, data: &[u8]) -> StorageResult<String>;

    /// Read the bytes behind a reference
    fn get(&self, storage_ref: &str) -> StorageResult<Vec<u8>>;

    /// Remove the bytes behind a reference
    fn delete(&self, storage_ref: &str) -> StorageResult<()>;
}
