//! # Metadata Storage
//!
//! Durable mapping from file id to `FileRecord`. This is the only shared
//! mutable state of the engine.
//!
//! Both implementations serialize creates behind a write lock: the id is
//! drawn, checked for collision and inserted under the same guard, and
//! readers only ever receive a cloned, fully built record.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{MetadataError, MetadataResult};
use super::record::{FileDraft, FileRecord};

/// Trait for metadata storage operations
pub trait MetadataStore: Send + Sync {
    /// Persist a new record, assigning its id and creation time
    fn create(&self, draft: FileDraft, now: DateTime<Utc>) -> MetadataResult<FileRecord>;

    /// Fetch a record
    fn get(&self, id: &Uuid) -> MetadataResult<FileRecord>;

    /// Remove a record, returning it
    fn delete(&self, id: &Uuid) -> MetadataResult<FileRecord>;

    /// Records whose availability window closed before `now`
    fn expired_before(&self, now: DateTime<Utc>) -> MetadataResult<Vec<FileRecord>>;

    /// Number of stored records
    fn len(&self) -> MetadataResult<usize>;
}

fn fresh_id(records: &HashMap<Uuid, FileRecord>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if !records.contains_key(&id) {
            return id;
        }
    }
}

fn lock_poisoned() -> MetadataError {
    MetadataError::Internal("Lock poisoned".to_string())
}

/// In-memory metadata store
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<Uuid, FileRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn create(&self, draft: FileDraft, now: DateTime<Utc>) -> MetadataResult<FileRecord> {
        let mut records = self.records.write().map_err(|_| lock_poisoned())?;
        let record = draft.into_record(fresh_id(&records), now);
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    fn get(&self, id: &Uuid) -> MetadataResult<FileRecord> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        records.get(id).cloned().ok_or(MetadataError::NotFound(*id))
    }

    fn delete(&self, id: &Uuid) -> MetadataResult<FileRecord> {
        let mut records = self.records.write().map_err(|_| lock_poisoned())?;
        records.remove(id).ok_or(MetadataError::NotFound(*id))
    }

    fn expired_before(&self, now: DateTime<Utc>) -> MetadataResult<Vec<FileRecord>> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        Ok(records
            .values()
            .filter(|r| r.is_expired_at(now))
            .cloned()
            .collect())
    }

    fn len(&self) -> MetadataResult<usize> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        Ok(records.len())
    }
}

/// On-disk layout of the metadata file
#[derive(Debug, Serialize, Deserialize)]
struct MetadataSnapshot {
    version: u32,
    records: Vec<FileRecord>,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Metadata store persisted as a single JSON document
///
/// Every mutation rewrites the document to a temporary file and renames it
/// over the old one while the write lock is held. If persisting fails the
/// in-memory change is undone, so memory and disk never disagree.
#[derive(Debug)]
pub struct JsonFileMetadataStore {
    path: PathBuf,
    records: RwLock<HashMap<Uuid, FileRecord>>,
}

impl JsonFileMetadataStore {
    /// Open (or start) a metadata file
    pub fn open(path: impl Into<PathBuf>) -> MetadataResult<Self> {
        let path = path.into();

        let records = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: MetadataSnapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| MetadataError::Corrupt(e.to_string()))?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(MetadataError::Corrupt(format!(
                        "unsupported version {}",
                        snapshot.version
                    )));
                }
                let mut records = HashMap::with_capacity(snapshot.records.len());
                for record in snapshot.records {
                    if let Some(violation) = record.integrity_violation() {
                        return Err(MetadataError::Corrupt(format!(
                            "record {}: {}",
                            record.id(),
                            violation
                        )));
                    }
                    if records.insert(record.id(), record).is_some() {
                        return Err(MetadataError::Corrupt("duplicate record id".to_string()));
                    }
                }
                records
            }
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(MetadataError::Io(e.to_string())),
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &HashMap<Uuid, FileRecord>) -> MetadataResult<()> {
        let mut sorted: Vec<FileRecord> = records.values().cloned().collect();
        sorted.sort_by_key(|r| (r.created_at(), r.id()));

        let snapshot = MetadataSnapshot {
            version: SNAPSHOT_VERSION,
            records: sorted,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| MetadataError::Internal(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| MetadataError::Io(e.to_string()))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| MetadataError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            MetadataError::Io(e.to_string())
        })
    }
}

impl MetadataStore for JsonFileMetadataStore {
    fn create(&self, draft: FileDraft, now: DateTime<Utc>) -> MetadataResult<FileRecord> {
        let mut records = self.records.write().map_err(|_| lock_poisoned())?;
        let record = draft.into_record(fresh_id(&records), now);
        records.insert(record.id(), record.clone());

        if let Err(e) = self.persist(&records) {
            records.remove(&record.id());
            return Err(e);
        }
        Ok(record)
    }

    fn get(&self, id: &Uuid) -> MetadataResult<FileRecord> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        records.get(id).cloned().ok_or(MetadataError::NotFound(*id))
    }

    fn delete(&self, id: &Uuid) -> MetadataResult<FileRecord> {
        let mut records = self.records.write().map_err(|_| lock_poisoned())?;
        let removed = records.remove(id).ok_or(MetadataError::NotFound(*id))?;

        if let Err(e) = self.persist(&records) {
            records.insert(removed.id(), removed);
            return Err(e);
        }
        Ok(removed)
    }

    fn expired_before(&self, now: DateTime<Utc>) -> MetadataResult<Vec<FileRecord>> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        Ok(records
            .values()
            .filter(|r| r.is_expired_at(now))
            .cloned()
            .collect())
    }

    fn len(&self) -> MetadataResult<usize> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        Ok(records.len())
    }
}
