use lifeloop_shared::{Identity, IdentityId};

use crate::error::SyncError;

/// The identity a call is made on behalf of.
///
/// Built by the caller whenever the identity provider reports a change and
/// passed into every service call. Only authenticated identities are
/// "bound": guests own entries but have no remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    identity: Identity,
}

impl SessionContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn bound_identity(&self) -> Option<&IdentityId> {
        self.identity.authenticated_id()
    }

    /// Id new entries are tagged with.
    pub fn owner_id(&self) -> Option<&IdentityId> {
        self.identity.current_id()
    }

    pub(crate) fn require_bound(&self) -> Result<&IdentityId, SyncError> {
        self.bound_identity().ok_or(SyncError::NotAuthenticated)
    }
}

impl From<Identity> for SessionContext {
    fn from(identity: Identity) -> Self {
        Self::new(identity)
    }
}
