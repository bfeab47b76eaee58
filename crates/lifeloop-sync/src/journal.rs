//! The flows the app drives: load, save, delete, force sync, and the
//! identity transitions around guest mode.
//!
//! Saves and deletes await their local write before touching the remote, so
//! a push never races ahead of the state it mirrors. Sign-in migration is the
//! exception: it pushes first and only then records the new owners locally.

use std::sync::Arc;

use tracing::info;

use lifeloop_shared::{now_millis, EntryDraft, EntryId, Identity, JournalEntry};
use lifeloop_store::{Database, EntryStore, GuestSession, KeyValueStore};

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::gateway::{HttpGateway, RemoteGateway};
use crate::merge::{pushable_entries, MigrationOutcome};
use crate::service::SyncService;
use crate::session::SessionContext;

pub struct Journal {
    entries: EntryStore,
    guest: GuestSession,
    sync: SyncService,
}

impl Journal {
    pub fn new(kv: Arc<dyn KeyValueStore>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            entries: EntryStore::new(kv.clone()),
            guest: GuestSession::new(kv),
            sync: SyncService::new(gateway),
        }
    }

    /// Open the on-disk journal and an HTTP gateway as configured.
    pub fn open(config: &ClientConfig) -> Result<Self, SyncError> {
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let gateway = HttpGateway::from_config(config)?;
        info!(remote = %config.remote_url, "journal opened");
        Ok(Self::new(Arc::new(db), Arc::new(gateway)))
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn guest(&self) -> &GuestSession {
        &self.guest
    }

    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    /// Local entries merged with the remote collection when signed in.
    pub async fn load(&self, ctx: &SessionContext) -> Vec<JournalEntry> {
        let local = self.entries.list_all().await;
        self.sync.refresh(ctx, local).await
    }

    /// Create or edit the memory for `draft.date`.
    ///
    /// The draft is applied to the day's current entry: the local one, or
    /// for a signed-in session the remote one when it is newer. The lookup
    /// and the write happen under the store's lock, so concurrent saves for
    /// one day keep a single id. The local write is kept even if the
    /// following push fails; the push error is still returned.
    pub async fn save_entry(
        &self,
        ctx: &SessionContext,
        draft: EntryDraft,
    ) -> Result<Vec<JournalEntry>, SyncError> {
        let remote_day = match ctx.bound_identity() {
            Some(_) => self
                .sync
                .refresh(ctx, Vec::new())
                .await
                .into_iter()
                .find(|e| e.date == draft.date),
            None => None,
        };

        let owner = ctx.owner_id();
        let now = now_millis();
        let (saved, entries) = self
            .entries
            .upsert_with(draft.date, |local| {
                let existing = match (local, remote_day.as_ref()) {
                    (Some(l), Some(r)) if r.created_at > l.created_at => Some(r),
                    (Some(l), _) => Some(l),
                    (None, r) => r,
                };
                draft.into_entry(existing, owner, now).map_err(SyncError::from)
            })
            .await?;

        if ctx.bound_identity().is_some() {
            self.sync.push_one(ctx, &saved).await?;
        }
        Ok(entries)
    }

    pub async fn delete_entry(
        &self,
        ctx: &SessionContext,
        id: &EntryId,
    ) -> Result<Vec<JournalEntry>, SyncError> {
        let entries = self.entries.remove(id).await?;
        if ctx.bound_identity().is_some() {
            self.sync.delete_remote(ctx, id).await?;
        }
        Ok(entries)
    }

    /// Push the signed-in identity's entries, and unowned ones, in one
    /// batch. Returns how many were sent.
    pub async fn sync_to_cloud(&self, ctx: &SessionContext) -> Result<usize, SyncError> {
        let owner = ctx.require_bound()?;
        let entries = pushable_entries(owner, self.entries.list_all().await);
        self.sync.push_all(ctx, &entries).await?;
        Ok(entries.len())
    }

    /// Hand the device's guest entries over to the identity that just signed in.
    ///
    /// Claimed entries are pushed before the new owners are written locally,
    /// so after a failed push a retry still finds them to claim. Guest mode
    /// is cleared once everything succeeded.
    pub async fn on_signed_in(&self, ctx: &SessionContext) -> Result<MigrationOutcome, SyncError> {
        let owner = ctx.require_bound()?.clone();
        let local = self.entries.list_all().await;

        let outcome = match self.guest.guest_id().await? {
            Some(guest_id) => {
                let outcome = SyncService::migrate_guest_to_authenticated(&guest_id, &owner, local);
                if outcome.migrated_count > 0 {
                    let owned = pushable_entries(&owner, outcome.entries.clone());
                    self.sync.push_all(ctx, &owned).await?;
                    self.entries.replace_all(&outcome.entries).await?;
                    info!(
                        guest_id = %guest_id,
                        identity = %owner,
                        migrated = outcome.migrated_count,
                        "migrated guest entries"
                    );
                }
                outcome
            }
            None => MigrationOutcome {
                entries: local,
                migrated_count: 0,
            },
        };

        self.guest.clear_guest_mode().await?;
        Ok(outcome)
    }

    pub async fn continue_as_guest(&self) -> Result<Identity, SyncError> {
        let id = self.guest.continue_as_guest().await?;
        Ok(Identity::guest(id))
    }

    /// Leave any guest session. Local entries stay on the device.
    pub async fn sign_out(&self) -> Result<Identity, SyncError> {
        self.guest.clear_guest_mode().await?;
        info!("signed out");
        Ok(Identity::None)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use lifeloop_shared::{AuthProvider, EntryError, IdentityId, Mood, RemoteRecord};
    use lifeloop_store::MemoryStore;

    use super::*;
    use crate::gateway::MemoryGateway;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft(day: &str, caption: &str) -> EntryDraft {
        EntryDraft {
            date: date(day),
            image_uri: format!("file:///photos/{day}.jpg"),
            caption: caption.to_string(),
            mood: Some(Mood::Good),
        }
    }

    fn bound(id: &str) -> SessionContext {
        Identity::authenticated(IdentityId::from(id), AuthProvider::Google).into()
    }

    fn journal() -> (Journal, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new());
        let journal = Journal::new(Arc::new(MemoryStore::new()), gateway.clone());
        (journal, gateway)
    }

    #[tokio::test]
    async fn test_guest_save_stays_local() {
        let (journal, gateway) = journal();
        let ctx: SessionContext = journal.continue_as_guest().await.unwrap().into();
        let guest_id = ctx.owner_id().cloned().unwrap();

        let entries = journal.save_entry(&ctx, draft("2024-06-01", "  hello  ")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].caption, "hello");
        assert_eq!(entries[0].owner_id, Some(guest_id.clone()));
        assert!(gateway.records(&guest_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_editing_a_day_keeps_its_identity() {
        let (journal, _) = journal();
        let ctx = SessionContext::unbound();

        let first = journal.save_entry(&ctx, draft("2024-06-01", "first")).await.unwrap();
        let second = journal.save_entry(&ctx, draft("2024-06-01", "second")).await.unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].created_at, first[0].created_at);
        assert_eq!(second[0].caption, "second");
    }

    #[tokio::test]
    async fn test_invalid_draft_writes_nothing() {
        let (journal, _) = journal();
        let ctx = SessionContext::unbound();

        let long = "x".repeat(101);
        assert!(matches!(
            journal.save_entry(&ctx, draft("2024-06-01", &long)).await,
            Err(SyncError::InvalidEntry(EntryError::CaptionTooLong { len: 101, .. }))
        ));
        assert!(journal.entries().list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_bound_save_and_delete_reach_the_remote() {
        let (journal, gateway) = journal();
        let ctx = bound("uid_1");
        let owner = IdentityId::from("uid_1");

        let entries = journal.save_entry(&ctx, draft("2024-06-01", "hi")).await.unwrap();
        let remote = gateway.records(&owner).await;
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].entry.id, entries[0].id);

        let entries = journal.delete_entry(&ctx, &entries[0].id.clone()).await.unwrap();
        assert!(entries.is_empty());
        assert!(gateway.records(&owner).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_write() {
        let (journal, gateway) = journal();
        let ctx = bound("uid_1");
        gateway.set_offline(true);

        let result = journal.save_entry(&ctx, draft("2024-06-01", "offline")).await;
        assert!(matches!(result, Err(SyncError::Remote(_))));

        let local = journal.entries().list_all().await;
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].caption, "offline");
    }

    #[tokio::test]
    async fn test_load_merges_remote_entries() {
        let (journal, gateway) = journal();
        let ctx = bound("uid_1");
        let owner = IdentityId::from("uid_1");

        journal
            .save_entry(&SessionContext::unbound(), draft("2024-06-01", "local"))
            .await
            .unwrap();
        let remote_entry = JournalEntry {
            id: EntryId::from("from-other-device"),
            date: date("2024-06-02"),
            image_uri: "file:///other.jpg".into(),
            caption: "remote".into(),
            created_at: now_millis() + 10_000,
            mood: None,
            owner_id: Some(owner.clone()),
        };
        gateway
            .put(&owner, &RemoteRecord::new(remote_entry, owner.clone(), 0))
            .await
            .unwrap();

        let loaded = journal.load(&ctx).await;
        let captions: Vec<&str> = loaded.iter().map(|e| e.caption.as_str()).collect();
        assert_eq!(captions, vec!["remote", "local"]);

        // Nothing was written back locally.
        assert_eq!(journal.entries().list_all().await.len(), 1);
        assert_eq!(journal.load(&SessionContext::unbound()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_sync_to_cloud_requires_sign_in() {
        let (journal, gateway) = journal();
        let unbound = SessionContext::unbound();
        journal.save_entry(&unbound, draft("2024-06-01", "a")).await.unwrap();
        journal.save_entry(&unbound, draft("2024-06-02", "b")).await.unwrap();

        assert!(matches!(
            journal.sync_to_cloud(&unbound).await,
            Err(SyncError::NotAuthenticated)
        ));
        assert_eq!(journal.sync_to_cloud(&bound("uid_1")).await.unwrap(), 2);
        assert_eq!(gateway.records(&IdentityId::from("uid_1")).await.len(), 2);
    }

    #[tokio::test]
    async fn test_sign_in_migrates_guest_entries() {
        let (journal, gateway) = journal();
        let guest_ctx: SessionContext = journal.continue_as_guest().await.unwrap().into();
        journal.save_entry(&guest_ctx, draft("2024-06-01", "a")).await.unwrap();
        journal.save_entry(&guest_ctx, draft("2024-06-02", "b")).await.unwrap();

        let ctx = bound("uid_1");
        let outcome = journal.on_signed_in(&ctx).await.unwrap();
        assert_eq!(outcome.migrated_count, 2);
        assert!(!journal.guest().is_guest_mode().await.unwrap());

        let owner = IdentityId::from("uid_1");
        assert!(journal
            .entries()
            .list_all()
            .await
            .iter()
            .all(|e| e.is_owned_by(&owner)));
        assert_eq!(gateway.records(&owner).await.len(), 2);

        // A second sign-in has nothing left to claim.
        let again = journal.on_signed_in(&ctx).await.unwrap();
        assert_eq!(again.migrated_count, 0);
    }

    #[tokio::test]
    async fn test_offline_sign_in_can_be_retried() {
        let (journal, gateway) = journal();
        let guest_ctx: SessionContext = journal.continue_as_guest().await.unwrap().into();
        let guest_id = guest_ctx.owner_id().cloned().unwrap();
        journal.save_entry(&guest_ctx, draft("2024-06-01", "a")).await.unwrap();
        journal.save_entry(&guest_ctx, draft("2024-06-02", "b")).await.unwrap();

        let ctx = bound("uid_1");
        gateway.set_offline(true);
        assert!(matches!(
            journal.on_signed_in(&ctx).await,
            Err(SyncError::Remote(_))
        ));
        assert!(journal
            .entries()
            .list_all()
            .await
            .iter()
            .all(|e| e.is_owned_by(&guest_id)));
        assert!(journal.guest().is_guest_mode().await.unwrap());

        gateway.set_offline(false);
        let outcome = journal.on_signed_in(&ctx).await.unwrap();
        assert_eq!(outcome.migrated_count, 2);
        assert_eq!(gateway.records(&IdentityId::from("uid_1")).await.len(), 2);
        assert!(!journal.guest().is_guest_mode().await.unwrap());
    }

    #[tokio::test]
    async fn test_force_sync_skips_foreign_entries() {
        let (journal, gateway) = journal();
        journal
            .save_entry(&bound("uid_a"), draft("2024-06-01", "alice"))
            .await
            .unwrap();
        let guest_ctx: SessionContext = journal.continue_as_guest().await.unwrap().into();
        let guest_id = guest_ctx.owner_id().cloned().unwrap();
        journal.save_entry(&guest_ctx, draft("2024-06-02", "guest")).await.unwrap();
        journal
            .save_entry(&SessionContext::unbound(), draft("2024-06-03", "nobody"))
            .await
            .unwrap();

        assert_eq!(journal.sync_to_cloud(&bound("uid_b")).await.unwrap(), 1);

        let remote = gateway.records(&IdentityId::from("uid_b")).await;
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].entry.caption, "nobody");
        assert!(gateway.records(&guest_id).await.is_empty());
        assert_eq!(gateway.records(&IdentityId::from("uid_a")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_for_one_day_share_an_id() {
        let (journal, gateway) = journal();
        let journal = Arc::new(journal);

        let handles: Vec<_> = ["first", "second"]
            .into_iter()
            .map(|caption| {
                let journal = journal.clone();
                tokio::spawn(async move {
                    journal
                        .save_entry(&bound("uid_1"), draft("2024-06-01", caption))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(journal.entries().list_all().await.len(), 1);
        assert_eq!(gateway.records(&IdentityId::from("uid_1")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_reuses_id_of_day_recorded_elsewhere() {
        let (journal, gateway) = journal();
        let owner = IdentityId::from("uid_1");
        let elsewhere = JournalEntry {
            id: EntryId::from("from-other-device"),
            date: date("2024-06-01"),
            image_uri: "file:///other.jpg".into(),
            caption: "original".into(),
            created_at: 1_000,
            mood: None,
            owner_id: Some(owner.clone()),
        };
        gateway
            .put(&owner, &RemoteRecord::new(elsewhere, owner.clone(), 1_000))
            .await
            .unwrap();

        let entries = journal
            .save_entry(&bound("uid_1"), draft("2024-06-01", "edited"))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, EntryId::from("from-other-device"));
        assert_eq!(entries[0].created_at, 1_000);

        let remote = gateway.records(&owner).await;
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].entry.caption, "edited");
    }

    #[tokio::test]
    async fn test_sign_in_without_guest_history_is_a_no_op() {
        let (journal, gateway) = journal();
        let ctx = bound("uid_1");

        let outcome = journal.on_signed_in(&ctx).await.unwrap();
        assert_eq!(outcome.migrated_count, 0);
        assert!(outcome.entries.is_empty());
        assert!(gateway.records(&IdentityId::from("uid_1")).await.is_empty());

        assert!(matches!(
            journal.on_signed_in(&SessionContext::unbound()).await,
            Err(SyncError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_leaves_guest_mode() {
        let (journal, _) = journal();
        let guest = journal.continue_as_guest().await.unwrap();
        assert!(guest.is_guest());

        assert_eq!(journal.sign_out().await.unwrap(), Identity::None);
        assert_eq!(journal.guest().restore_identity().await.unwrap(), Identity::None);
    }

    #[tokio::test]
    async fn test_open_uses_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            db_path: Some(dir.path().join("journal.db")),
            ..ClientConfig::default()
        };

        let journal = Journal::open(&config).unwrap();
        journal
            .save_entry(&SessionContext::unbound(), draft("2024-06-01", "kept"))
            .await
            .unwrap();
        drop(journal);

        let reopened = Journal::open(&config).unwrap();
        let entries = reopened.load(&SessionContext::unbound()).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].caption, "kept");
    }
}
