//! Per-identity record collections on disk.
//!
//! Each identity's collection is a single JSON array at
//! `<base>/users/<uid>.json`. Every write replaces the whole file through a
//! temporary file and a rename, so a batch lands completely or not at all.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use lifeloop_shared::constants::MAX_IDENTITY_ID_LEN;
use lifeloop_shared::{EntryId, RemoteRecord};

use crate::error::ServerError;

/// Check that `uid` is usable as a collection name.
///
/// Only `[A-Za-z0-9_-]` is accepted, so a valid id can never name a path
/// outside the users directory.
pub fn validate_identity(uid: &str) -> Result<(), ServerError> {
    if uid.is_empty() || uid.len() > MAX_IDENTITY_ID_LEN {
        return Err(ServerError::InvalidIdentity(format!(
            "expected 1..={MAX_IDENTITY_ID_LEN} characters, got {}",
            uid.len()
        )));
    }
    if !uid
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(ServerError::InvalidIdentity(
            "only letters, digits, '_' and '-' are allowed".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug)]
pub struct CollectionStore {
    users_dir: PathBuf,
    // Serializes read-modify-write cycles across all collections.
    write_lock: Mutex<()>,
}

impl CollectionStore {
    pub async fn open(base_path: &Path) -> Result<Self, ServerError> {
        let users_dir = base_path.join("users");
        fs::create_dir_all(&users_dir).await.map_err(|e| {
            ServerError::Storage(format!(
                "Failed to create collection directory '{}': {}",
                users_dir.display(),
                e
            ))
        })?;

        info!(path = %users_dir.display(), "Collection store initialized");

        Ok(Self {
            users_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// All records of `uid`, newest `createdAt` first. Unknown identities
    /// have an empty collection.
    pub async fn list(&self, uid: &str) -> Result<Vec<RemoteRecord>, ServerError> {
        let mut records = self.load(uid).await?;
        records.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));
        Ok(records)
    }

    pub async fn put(&self, uid: &str, record: RemoteRecord) -> Result<(), ServerError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load(uid).await?;
        upsert(&mut records, record);
        self.store(uid, &records).await
    }

    /// Set every record in one file write. Returns how many were written.
    pub async fn put_batch(
        &self,
        uid: &str,
        batch: Vec<RemoteRecord>,
    ) -> Result<usize, ServerError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load(uid).await?;
        let count = batch.len();
        for record in batch {
            upsert(&mut records, record);
        }
        self.store(uid, &records).await?;
        info!(uid = %uid, records = count, "Batch written");
        Ok(count)
    }

    /// Remove one record. Returns whether it existed.
    pub async fn delete(&self, uid: &str, id: &EntryId) -> Result<bool, ServerError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load(uid).await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.store(uid, &records).await?;
        Ok(true)
    }

    fn collection_path(&self, uid: &str) -> Result<PathBuf, ServerError> {
        validate_identity(uid)?;
        Ok(self.users_dir.join(format!("{uid}.json")))
    }

    async fn load(&self, uid: &str) -> Result<Vec<RemoteRecord>, ServerError> {
        let path = self.collection_path(uid)?;
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ServerError::Storage(format!(
                    "Failed to read collection {uid}: {e}"
                )))
            }
        };
        serde_json::from_slice(&raw)
            .map_err(|e| ServerError::Storage(format!("Corrupt collection {uid}: {e}")))
    }

    async fn store(&self, uid: &str, records: &[RemoteRecord]) -> Result<(), ServerError> {
        let path = self.collection_path(uid)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(records)
            .map_err(|e| ServerError::Storage(format!("Failed to encode collection {uid}: {e}")))?;

        fs::write(&tmp, &json)
            .await
            .map_err(|e| ServerError::Storage(format!("Failed to write collection {uid}: {e}")))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| ServerError::Storage(format!("Failed to commit collection {uid}: {e}")))?;

        debug!(uid = %uid, records = records.len(), "Stored collection");
        Ok(())
    }
}

fn upsert(records: &mut Vec<RemoteRecord>, record: RemoteRecord) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}
