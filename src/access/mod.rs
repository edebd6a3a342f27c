//! # Access Module
//!
//! Upload validation, file metadata, and retrieval policy.
//!
//! The upload path produces records through a type-state chain:
//! `UploadCandidate -> ValidatedUpload -> SealedUpload -> FileDraft -> FileRecord`.
//! The retrieval path evaluates an `AccessProof` against a record's
//! `AccessRule` and availability window.

pub mod engine;
pub mod errors;
pub mod metadata;
pub mod policy;
pub mod record;
pub mod validator;

pub use engine::{
    AccessControlEngine, AuthorizedFile, Collaborators, EngineConfig, RetrievedFile, SweepReport,
};
pub use errors::{
    DenialReason, EngineError, EngineResult, MetadataError, MetadataResult, ValidationError,
};
pub use metadata::{InMemoryMetadataStore, JsonFileMetadataStore, MetadataStore};
pub use policy::{AccessDecision, AccessPolicyEvaluator, AccessProof};
pub use record::{AccessRule, FileDraft, FileRecord, Visibility};
pub use validator::{SealedUpload, UploadCandidate, UploadValidator, ValidatedUpload};
