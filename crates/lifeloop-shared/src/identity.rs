use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{GUEST_ID_PREFIX, GUEST_ID_RANDOM_LEN};
use crate::types::IdentityId;

/// How an authenticated identity signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
    Apple,
    Anonymous,
}

impl AuthProvider {
    /// Classify an identity provider's id string (`password`, `google.com`,
    /// `apple.com`). Anything else is treated as an anonymous backend account.
    pub fn from_provider_id(provider_id: &str) -> Self {
        match provider_id {
            "password" => Self::Email,
            "google.com" => Self::Google,
            "apple.com" => Self::Apple,
            _ => Self::Anonymous,
        }
    }
}

/// The identity the device is currently acting as.
///
/// Guests own entries locally but never sync; only `Authenticated`
/// identities have a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    #[default]
    None,
    Guest {
        id: IdentityId,
    },
    Authenticated {
        id: IdentityId,
        provider: AuthProvider,
    },
}

impl Identity {
    pub fn guest(id: IdentityId) -> Self {
        Self::Guest { id }
    }

    pub fn authenticated(id: IdentityId, provider: AuthProvider) -> Self {
        Self::Authenticated { id, provider }
    }

    /// Id to tag new entries with (guest or authenticated).
    pub fn current_id(&self) -> Option<&IdentityId> {
        match self {
            Self::None => None,
            Self::Guest { id } | Self::Authenticated { id, .. } => Some(id),
        }
    }

    /// The authenticated id, if any.
    pub fn authenticated_id(&self) -> Option<&IdentityId> {
        match self {
            Self::Authenticated { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest { .. })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Generate a fresh guest pseudo-id: `guest_` followed by 21 alphanumerics.
pub fn generate_guest_id() -> IdentityId {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GUEST_ID_RANDOM_LEN)
        .map(char::from)
        .collect();
    IdentityId(format!("{GUEST_ID_PREFIX}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_id_shape() {
        let id = generate_guest_id();
        assert!(id.as_str().starts_with(GUEST_ID_PREFIX));
        assert_eq!(id.as_str().len(), GUEST_ID_PREFIX.len() + GUEST_ID_RANDOM_LEN);
        assert_ne!(id, generate_guest_id());
    }

    #[test]
    fn test_provider_classification() {
        assert_eq!(AuthProvider::from_provider_id("password"), AuthProvider::Email);
        assert_eq!(AuthProvider::from_provider_id("google.com"), AuthProvider::Google);
        assert_eq!(AuthProvider::from_provider_id("apple.com"), AuthProvider::Apple);
        assert_eq!(AuthProvider::from_provider_id("github.com"), AuthProvider::Anonymous);
    }

    #[test]
    fn test_identity_accessors() {
        let guest = Identity::guest(IdentityId::from("guest_a"));
        assert_eq!(guest.current_id(), Some(&IdentityId::from("guest_a")));
        assert_eq!(guest.authenticated_id(), None);
        assert!(guest.is_guest());

        let user = Identity::authenticated(IdentityId::from("uid_1"), AuthProvider::Google);
        assert_eq!(user.authenticated_id(), Some(&IdentityId::from("uid_1")));
        assert!(user.is_authenticated());

        assert_eq!(Identity::None.current_id(), None);
    }
}
