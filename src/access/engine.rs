//! # Access Control Engine
//!
//! Orchestrates uploads and retrievals over injected collaborators.
//!
//! Upload: `Received -> (auth) -> Validated -> Hashed -> Persisted -> Accepted`.
//! Any rejection before `Persisted` leaves nothing behind: a blob written
//! for a record that then fails to persist is deleted again.
//!
//! Retrieval: `Received -> Looked Up -> Authorized -> Served`. A denial
//! never touches the blob store.

use std::sync::Arc;

use uuid::Uuid;

use super::errors::{EngineError, EngineResult};
use super::metadata::MetadataStore;
use super::policy::{AccessDecision, AccessPolicyEvaluator, AccessProof};
use super::record::{FileRecord, Visibility};
use super::validator::{UploadCandidate, UploadValidator};
use crate::auth::{AuthError, CredentialHasher, TokenVerifier};
use crate::clock::Clock;
use crate::file_storage::{BlobStore, StorageError};

/// Engine policy knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum characters of a file password
    pub min_password_length: usize,

    /// Reject private uploads from unauthenticated callers even when they
    /// set a password
    pub private_requires_auth: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            private_requires_auth: true,
        }
    }
}

/// External collaborators the engine is built from
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub store: Arc<dyn MetadataStore>,
    pub blobs: Arc<dyn BlobStore>,
}

/// A record the caller may open, with the verified subject that asked
#[derive(Debug, Clone)]
pub struct AuthorizedFile {
    pub record: FileRecord,
    pub viewer: Option<Uuid>,
}

impl AuthorizedFile {
    /// Whether the verified caller uploaded this file
    pub fn viewer_is_owner(&self) -> bool {
        self.viewer.is_some() && self.viewer == self.record.owner_id()
    }
}

/// A record together with its payload
#[derive(Debug, Clone)]
pub struct RetrievedFile {
    pub record: FileRecord,
    pub data: Vec<u8>,
}

/// Result of one retention sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub records_removed: usize,
    pub blobs_missing: usize,
}

/// Upload validation and access control engine
pub struct AccessControlEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn TokenVerifier>,
    hasher: Arc<dyn CredentialHasher>,
    store: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    validator: UploadValidator,
    evaluator: AccessPolicyEvaluator,
}

impl AccessControlEngine {
    pub fn new(config: EngineConfig, parts: Collaborators) -> Self {
        Self {
            validator: UploadValidator::new(config.min_password_length),
            evaluator: AccessPolicyEvaluator::new(Arc::clone(&parts.hasher)),
            config,
            clock: parts.clock,
            verifier: parts.verifier,
            hasher: parts.hasher,
            store: parts.store,
            blobs: parts.blobs,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Accept an upload, returning the persisted record
    pub fn upload(
        &self,
        candidate: UploadCandidate,
        credential: Option<&str>,
    ) -> EngineResult<FileRecord> {
        let result = self.try_upload(candidate, credential);
        match &result {
            Ok(record) => tracing::info!(
                file_id = %record.id(),
                size = record.size(),
                visibility = ?record.visibility(),
                protected = record.has_password(),
                owned = record.owner_id().is_some(),
                "upload accepted"
            ),
            Err(EngineError::Internal(detail)) => {
                tracing::error!(error = %detail, "upload failed")
            }
            Err(e) => tracing::warn!(code = e.code(), "upload rejected"),
        }
        result
    }

    fn try_upload(
        &self,
        candidate: UploadCandidate,
        credential: Option<&str>,
    ) -> EngineResult<FileRecord> {
        let now = self.clock.now();

        // A supplied credential must be valid; absence is judged after validation
        let owner_id = match credential {
            Some(token) => Some(self.verifier.verify(token, now)?),
            None => None,
        };

        let validated = self.validator.validate(candidate, owner_id)?;

        if validated.visibility() == Visibility::Private
            && validated.owner_id().is_none()
            && self.config.private_requires_auth
        {
            return Err(AuthError::MissingCredential.into());
        }

        let sealed = validated.seal(self.hasher.as_ref())?;
        let storage_ref = self.blobs.put(sealed.payload())?;
        let draft = sealed.into_draft(storage_ref);

        match self.store.create(draft.clone(), now) {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(draft.storage_ref()) {
                    tracing::error!(
                        storage_ref = draft.storage_ref(),
                        error = %cleanup,
                        "orphaned blob after failed create"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Decide access to a record without fetching its payload
    pub fn authorize(
        &self,
        id: &Uuid,
        credential: Option<&str>,
        password: Option<&str>,
    ) -> EngineResult<FileRecord> {
        self.authorize_viewer(id, credential, password)
            .map(|authorized| authorized.record)
    }

    /// Like `authorize`, also reporting who the verified caller is
    pub fn authorize_viewer(
        &self,
        id: &Uuid,
        credential: Option<&str>,
        password: Option<&str>,
    ) -> EngineResult<AuthorizedFile> {
        let now = self.clock.now();
        let record = self.store.get(id)?;

        // Anonymous proofs are fine; a bad credential is not
        let subject = match credential {
            Some(token) => Some(self.verifier.verify(token, now).map_err(|e| {
                tracing::warn!(file_id = %id, code = ?e, "retrieval with bad credential");
                EngineError::from(e)
            })?),
            None => None,
        };

        let proof = AccessProof {
            subject,
            password: password.map(str::to_string),
        };

        match self.evaluator.authorize(&record, &proof, now) {
            AccessDecision::Granted => {
                tracing::info!(file_id = %id, "access granted");
                Ok(AuthorizedFile {
                    record,
                    viewer: subject,
                })
            }
            AccessDecision::Denied(reason) => {
                tracing::info!(file_id = %id, reason = reason.code(), "access denied");
                Err(reason.into())
            }
        }
    }

    /// Authorize and fetch the payload
    pub fn retrieve(
        &self,
        id: &Uuid,
        credential: Option<&str>,
        password: Option<&str>,
    ) -> EngineResult<RetrievedFile> {
        let record = self.authorize(id, credential, password)?;

        let data = self.blobs.get(record.storage_ref()).map_err(|e| {
            tracing::error!(file_id = %id, error = %e, "blob unavailable for stored record");
            EngineError::from(e)
        })?;

        Ok(RetrievedFile { record, data })
    }

    /// Delete every record whose window has closed, along with its blob
    pub fn sweep_expired(&self) -> EngineResult<SweepReport> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for record in self.store.expired_before(now)? {
            // Record before blob
            self.store.delete(&record.id())?;
            report.records_removed += 1;

            match self.blobs.delete(record.storage_ref()) {
                Ok(()) => {}
                Err(StorageError::ObjectNotFound(_)) => report.blobs_missing += 1,
                Err(e) => tracing::warn!(
                    file_id = %record.id(),
                    error = %e,
                    "blob left behind by retention sweep"
                ),
            }
        }

        if report.records_removed > 0 {
            tracing::info!(removed = report.records_removed, "retention sweep");
        }
        Ok(report)
    }
}
