use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use lifeloop_shared::types::sort_newest_first;
use lifeloop_shared::{EntryId, IdentityId, RemoteRecord};

use super::{GatewayError, RemoteGateway};

type Collection = HashMap<EntryId, RemoteRecord>;

/// In-process gateway. Collections live as long as the value does.
///
/// `set_offline(true)` makes every call fail with
/// [`GatewayError::Unavailable`], which is how outages are simulated.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    collections: Mutex<HashMap<IdentityId, Collection>>,
    offline: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of one collection, newest first.
    pub async fn records(&self, owner: &IdentityId) -> Vec<RemoteRecord> {
        let collections = self.collections.lock().await;
        let mut records: Vec<RemoteRecord> = collections
            .get(owner)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        sort_records(&mut records);
        records
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("gateway offline".into()));
        }
        Ok(())
    }
}

fn sort_records(records: &mut [RemoteRecord]) {
    records.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn fetch_all(&self, owner: &IdentityId) -> Result<Vec<RemoteRecord>, GatewayError> {
        self.check_online()?;
        Ok(self.records(owner).await)
    }

    async fn put(&self, owner: &IdentityId, record: &RemoteRecord) -> Result<(), GatewayError> {
        self.check_online()?;
        self.collections
            .lock()
            .await
            .entry(owner.clone())
            .or_default()
            .insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn put_batch(
        &self,
        owner: &IdentityId,
        records: &[RemoteRecord],
    ) -> Result<(), GatewayError> {
        self.check_online()?;
        let mut collections = self.collections.lock().await;
        let collection = collections.entry(owner.clone()).or_default();
        for record in records {
            collection.insert(record.id().clone(), record.clone());
        }
        Ok(())
    }

    async fn delete(&self, owner: &IdentityId, id: &EntryId) -> Result<(), GatewayError> {
        self.check_online()?;
        if let Some(collection) = self.collections.lock().await.get_mut(owner) {
            collection.remove(id);
        }
        Ok(())
    }
}
