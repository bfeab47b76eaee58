//! Persistent guest identity.
//!
//! The guest pseudo-id is generated once and never deleted, even after the
//! user signs in: keeping it is what lets a later sign-in migrate the guest's
//! entries, and prevents the same id from being reissued.

use std::sync::Arc;

use tracing::info;

use lifeloop_shared::constants::{GUEST_MODE_KEY, GUEST_USER_ID_KEY};
use lifeloop_shared::identity::generate_guest_id;
use lifeloop_shared::{Identity, IdentityId};

use crate::error::Result;
use crate::kv::KeyValueStore;

pub struct GuestSession {
    kv: Arc<dyn KeyValueStore>,
}

impl GuestSession {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored guest id, if one was ever created.
    pub async fn guest_id(&self) -> Result<Option<IdentityId>> {
        Ok(self
            .kv
            .get(GUEST_USER_ID_KEY)
            .await?
            .filter(|id| !id.is_empty())
            .map(IdentityId))
    }

    pub async fn load_or_create_guest_id(&self) -> Result<IdentityId> {
        if let Some(id) = self.guest_id().await? {
            return Ok(id);
        }
        let id = generate_guest_id();
        self.kv.set(GUEST_USER_ID_KEY, id.as_str()).await?;
        info!(guest_id = %id, "created guest id");
        Ok(id)
    }

    pub async fn is_guest_mode(&self) -> Result<bool> {
        Ok(self.kv.get(GUEST_MODE_KEY).await?.as_deref() == Some("true"))
    }

    /// Enter guest mode, creating the guest id on first use.
    pub async fn continue_as_guest(&self) -> Result<IdentityId> {
        self.kv.set(GUEST_MODE_KEY, "true").await?;
        let id = self.load_or_create_guest_id().await?;
        info!(guest_id = %id, "continuing as guest");
        Ok(id)
    }

    /// Leave guest mode. The guest id itself is kept.
    pub async fn clear_guest_mode(&self) -> Result<()> {
        self.kv.remove(GUEST_MODE_KEY).await
    }

    /// Identity to resume with on startup when nobody is signed in.
    pub async fn restore_identity(&self) -> Result<Identity> {
        if !self.is_guest_mode().await? {
            return Ok(Identity::None);
        }
        Ok(Identity::guest(self.load_or_create_guest_id().await?))
    }
}
