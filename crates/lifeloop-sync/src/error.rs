use thiserror::Error;

use lifeloop_shared::EntryError;
use lifeloop_store::StoreError;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A remote operation was attempted without a signed-in identity.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The local write did not persist.
    #[error("Local storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] GatewayError),

    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] EntryError),
}
