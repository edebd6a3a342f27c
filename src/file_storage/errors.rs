//! # Blob Storage Errors

use thiserror::Error;

/// Result type for blob storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Storage reference that the backend did not produce
    #[error("Invalid storage reference: {0}")]
    InvalidRef(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::ObjectNotFound(_) => 404,
            StorageError::InvalidRef(_) => 400,
            StorageError::IoError(_) => 500,
            StorageError::Internal(_) => 500,
        }
    }
}
