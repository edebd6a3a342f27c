//! # File Records
//!
//! A `FileRecord` is immutable once created. Its fields are private; the
//! only way to obtain one is through a `FileDraft`, and the only way to
//! obtain a draft is from an upload that passed validation. That chain is
//! what keeps an unreachable record (private, no password, no owner) from
//! ever existing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default retrieval access of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_is_public(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// How a record may be unlocked, ignoring the availability window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule<'a> {
    /// Public and passwordless: anyone
    Public,

    /// Password required; the owner, if any, bypasses it
    PasswordProtected {
        owner_id: Option<Uuid>,
        password_hash: &'a str,
    },

    /// Private and passwordless: the owner only
    OwnerOnly { owner_id: Option<Uuid> },
}

/// Everything a store needs to persist a new record, minus id and creation time
#[derive(Debug, Clone)]
pub struct FileDraft {
    pub(crate) owner_id: Option<Uuid>,
    pub(crate) storage_ref: String,
    pub(crate) visibility: Visibility,
    pub(crate) password_hash: Option<String>,
    pub(crate) available_from: Option<DateTime<Utc>>,
    pub(crate) available_to: Option<DateTime<Utc>>,
    pub(crate) size: u64,
    pub(crate) file_name: String,
    pub(crate) content_type: String,
    pub(crate) checksum: String,
}

impl FileDraft {
    /// Finalize into a record; called by a metadata store inside its create
    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id,
            owner_id: self.owner_id,
            storage_ref: self.storage_ref,
            visibility: self.visibility,
            password_hash: self.password_hash,
            available_from: self.available_from,
            available_to: self.available_to,
            created_at,
            size: self.size,
            file_name: self.file_name,
            content_type: self.content_type,
            checksum: self.checksum,
        }
    }

    pub fn storage_ref(&self) -> &str {
        &self.storage_ref
    }
}

/// Metadata of one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    id: Uuid,
    owner_id: Option<Uuid>,
    storage_ref: String,
    visibility: Visibility,
    password_hash: Option<String>,
    available_from: Option<DateTime<Utc>>,
    available_to: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    size: u64,
    file_name: String,
    content_type: String,
    checksum: String,
}

impl FileRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn storage_ref(&self) -> &str {
        &self.storage_ref
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn available_from(&self) -> Option<DateTime<Utc>> {
        self.available_from
    }

    pub fn available_to(&self) -> Option<DateTime<Utc>> {
        self.available_to
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// SHA-256 of the payload, lowercase hex
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Whether `now` lies inside the inclusive availability window
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.available_from.map_or(true, |from| now >= from);
        let not_ended = self.available_to.map_or(true, |to| now <= to);
        started && not_ended
    }

    /// Whether the window closed before `now`; such a record can never be served again
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.available_to.map_or(false, |to| now > to)
    }

    /// First structural rule this record breaks, if any
    ///
    /// Records built from a draft always pass; only records read back from
    /// outside (a metadata file) can fail.
    pub fn integrity_violation(&self) -> Option<&'static str> {
        if let (Some(from), Some(to)) = (self.available_from, self.available_to) {
            if from >= to {
                return Some("availability window does not end after it starts");
            }
        }
        if let AccessRule::OwnerOnly { owner_id: None } = self.access_rule() {
            return Some("private record has neither owner nor password");
        }
        None
    }

    pub fn access_rule(&self) -> AccessRule<'_> {
        match (&self.password_hash, self.visibility) {
            (Some(hash), _) => AccessRule::PasswordProtected {
                owner_id: self.owner_id,
                password_hash: hash,
            },
            (None, Visibility::Public) => AccessRule::Public,
            (None, Visibility::Private) => AccessRule::OwnerOnly {
                owner_id: self.owner_id,
            },
        }
    }
}
