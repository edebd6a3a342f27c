//! # Access Engine Errors
//!
//! Every failure the engine can report is one of five distinguishable kinds,
//! so the boundary layer can map them to responses without losing detail.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::file_storage::StorageError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for metadata store operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Upload rejected before anything was stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A non-empty file is required")]
    MissingFile,

    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("availableFrom must be before availableTo")]
    InvalidDateRange,

    #[error("A private file needs a password or an authenticated owner")]
    UnauthorizedPrivateUpload,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFile => "MISSING_FILE",
            ValidationError::WeakPassword { .. } => "WEAK_PASSWORD",
            ValidationError::InvalidDateRange => "INVALID_DATE_RANGE",
            ValidationError::UnauthorizedPrivateUpload => "UNAUTHORIZED_PRIVATE_UPLOAD",
        }
    }
}

/// Why a retrieval was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("File is not available at this time")]
    OutsideAvailabilityWindow,

    #[error("Access to this file requires a valid password or ownership")]
    InsufficientProof,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::OutsideAvailabilityWindow => "OUTSIDE_AVAILABILITY_WINDOW",
            DenialReason::InsufficientProof => "INSUFFICIENT_PROOF",
        }
    }
}

/// Metadata store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("File record not found: {0}")]
    NotFound(Uuid),

    #[error("Metadata I/O error: {0}")]
    Io(String),

    #[error("Metadata file is corrupt: {0}")]
    Corrupt(String),

    #[error("Metadata internal error: {0}")]
    Internal(String),
}

/// Engine error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(AuthError),

    #[error(transparent)]
    Denied(DenialReason),

    #[error("File not found: {0}")]
    NotFound(Uuid),

    /// Collaborator failure; the detail is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP status class for this error
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::Auth(_) => 401,
            EngineError::Denied(_) => 403,
            EngineError::NotFound(_) => 404,
            EngineError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(e) => e.code(),
            EngineError::Auth(e) => e.code(),
            EngineError::Denied(reason) => reason.code(),
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand to the caller
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Internal(_) => "Internal server error".to_string(),
            EngineError::NotFound(_) => "File not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for EngineError {
    fn from(err: AuthError) -> Self {
        if err.is_credential_error() {
            EngineError::Auth(err)
        } else {
            EngineError::Internal(err.to_string())
        }
    }
}

impl From<DenialReason> for EngineError {
    fn from(reason: DenialReason) -> Self {
        EngineError::Denied(reason)
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        EngineError::Internal(format!("blob store: {}", err))
    }
}

impl From<MetadataError> for EngineError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Internal(format!("metadata store: {}", other)),
        }
    }
}
