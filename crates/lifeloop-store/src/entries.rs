//! Local Entry Store: the device's journal entries as one JSON block.
//!
//! At most one entry exists per calendar date. `upsert` enforces that by
//! replacing on `date`; `remove` works on `id`. `list_all` fails soft.
//! Mutations only fail soft on a block that cannot be decoded, which they
//! overwrite; a failed read from the backend aborts the write.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use lifeloop_shared::constants::ENTRIES_KEY;
use lifeloop_shared::types::sort_newest_first;
use lifeloop_shared::{EntryId, JournalEntry};

use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;

pub struct EntryStore {
    kv: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles issued through this handle.
    write_lock: Mutex<()>,
}

impl EntryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// All entries, newest `created_at` first.
    ///
    /// A missing block yields an empty list. So does a block that cannot be
    /// read or decoded; the failure is logged and not returned.
    pub async fn list_all(&self) -> Vec<JournalEntry> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to load entries, continuing with an empty list");
                Vec::new()
            }
        }
    }

    /// Overwrite the whole block with one storage write.
    pub async fn replace_all(&self, entries: &[JournalEntry]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist(entries).await
    }

    /// Create or update the entry for `entry.date`.
    ///
    /// Any stored entry with the same date is dropped, whatever its id.
    /// Returns the full list as persisted.
    pub async fn upsert(&self, entry: JournalEntry) -> Result<Vec<JournalEntry>> {
        let (_, entries) = self
            .upsert_with(entry.date, |_| Ok::<_, StoreError>(entry))
            .await?;
        Ok(entries)
    }

    /// Like [`upsert`](Self::upsert), but the entry is built from the one
    /// currently stored for `date`, under the same lock as the write.
    ///
    /// Two concurrent calls for one date therefore see each other: the
    /// second one is handed the entry the first one wrote.
    pub async fn upsert_with<F, E>(
        &self,
        date: NaiveDate,
        build: F,
    ) -> std::result::Result<(JournalEntry, Vec<JournalEntry>), E>
    where
        F: FnOnce(Option<&JournalEntry>) -> std::result::Result<JournalEntry, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load_for_write().await?;
        let entry = build(entries.iter().find(|e| e.date == date))?;
        entries.retain(|e| e.date != entry.date);

        debug!(id = %entry.id, date = %entry.date, "upserting entry");
        entries.insert(0, entry.clone());
        sort_newest_first(&mut entries);

        self.persist(&entries).await?;
        Ok((entry, entries))
    }

    /// Delete the entry with `id`. Unknown ids leave the list unchanged.
    pub async fn remove(&self, id: &EntryId) -> Result<Vec<JournalEntry>> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load_for_write().await?;
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        debug!(id = %id, removed = before - entries.len(), "removing entry");

        self.persist(&entries).await?;
        Ok(entries)
    }

    pub async fn find_by_date(&self, date: NaiveDate) -> Option<JournalEntry> {
        self.list_all().await.into_iter().find(|e| e.date == date)
    }

    async fn load(&self) -> Result<Vec<JournalEntry>> {
        let raw = match self.kv.get(ENTRIES_KEY).await? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        let mut entries: Vec<JournalEntry> = serde_json::from_str(&raw)?;
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Current entries for a mutation. An undecodable block counts as empty
    /// and gets overwritten; any backend error is returned.
    async fn load_for_write(&self) -> Result<Vec<JournalEntry>> {
        match self.load().await {
            Err(StoreError::Serialization(e)) => {
                warn!(error = %e, "entries block is unreadable, it will be overwritten");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn persist(&self, entries: &[JournalEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.kv.set(ENTRIES_KEY, &json).await.map_err(|e| {
            warn!(error = %e, entries = entries.len(), "failed to persist entries");
            e
        })
    }
}
