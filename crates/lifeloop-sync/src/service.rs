use std::sync::Arc;

use tracing::{debug, info, warn};

use lifeloop_shared::{now_millis, EntryId, IdentityId, JournalEntry, RemoteRecord};

use crate::error::SyncError;
use crate::gateway::RemoteGateway;
use crate::merge::{merge_by_date, migrate_guest_entries, MigrationOutcome};
use crate::session::SessionContext;

/// Remote half of the journal: refresh, push and delete against the bound
/// identity's collection.
///
/// Passive reads (`refresh`) never fail; explicit writes (`push_one`,
/// `push_all`, `delete_remote`) report every failure.
pub struct SyncService {
    gateway: Arc<dyn RemoteGateway>,
}

impl SyncService {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    /// Merge `local` with the bound identity's remote collection.
    ///
    /// Returns `local` untouched when no identity is bound or the remote
    /// cannot be read.
    pub async fn refresh(
        &self,
        ctx: &SessionContext,
        local: Vec<JournalEntry>,
    ) -> Vec<JournalEntry> {
        let Some(owner) = ctx.bound_identity() else {
            return local;
        };

        match self.gateway.fetch_all(owner).await {
            Ok(records) => {
                let remote: Vec<JournalEntry> =
                    records.into_iter().map(RemoteRecord::into_entry).collect();
                let (local_count, remote_count) = (local.len(), remote.len());
                let merged = merge_by_date(local, remote);
                debug!(
                    identity = %owner,
                    local = local_count,
                    remote = remote_count,
                    merged = merged.len(),
                    "merged remote collection"
                );
                merged
            }
            Err(e) => {
                warn!(identity = %owner, error = %e, "remote fetch failed, using local entries");
                local
            }
        }
    }

    pub async fn push_one(&self, ctx: &SessionContext, entry: &JournalEntry) -> Result<(), SyncError> {
        let owner = ctx.require_bound()?;
        let record = to_record(entry, owner, now_millis());
        self.gateway.put(owner, &record).await?;
        debug!(identity = %owner, id = %entry.id, date = %entry.date, "pushed entry");
        Ok(())
    }

    /// Write all `entries` in one atomic batch.
    pub async fn push_all(
        &self,
        ctx: &SessionContext,
        entries: &[JournalEntry],
    ) -> Result<(), SyncError> {
        let owner = ctx.require_bound()?;
        if entries.is_empty() {
            return Ok(());
        }

        let synced_at = now_millis();
        let records: Vec<RemoteRecord> = entries
            .iter()
            .map(|entry| to_record(entry, owner, synced_at))
            .collect();
        self.gateway.put_batch(owner, &records).await?;
        info!(identity = %owner, entries = records.len(), "batch synced entries");
        Ok(())
    }

    /// Delete one remote record. Already-missing records count as deleted.
    pub async fn delete_remote(&self, ctx: &SessionContext, id: &EntryId) -> Result<(), SyncError> {
        let owner = ctx.require_bound()?;
        self.gateway.delete(owner, id).await?;
        debug!(identity = %owner, id = %id, "deleted remote entry");
        Ok(())
    }

    /// See [`migrate_guest_entries`]. Touches neither local nor remote state.
    pub fn migrate_guest_to_authenticated(
        guest_id: &IdentityId,
        new_id: &IdentityId,
        local: Vec<JournalEntry>,
    ) -> MigrationOutcome {
        migrate_guest_entries(guest_id, new_id, local)
    }
}

fn to_record(entry: &JournalEntry, owner: &IdentityId, synced_at: i64) -> RemoteRecord {
    let mut entry = entry.clone();
    entry.owner_id = Some(owner.clone());
    RemoteRecord::new(entry, owner.clone(), synced_at)
}
