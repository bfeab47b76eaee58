//! Remote Collection Gateway contract.
//!
//! Every identity has its own collection of [`RemoteRecord`]s keyed by entry
//! id. The gateway supports single set/delete, an atomic batch set, and an
//! unpaginated query returning the whole collection newest first.

mod http;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use lifeloop_shared::{EntryId, IdentityId, RemoteRecord};

pub use http::HttpGateway;
pub use memory::MemoryGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Network failure, timeout, or the backend is down.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    #[error("Remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered with something we cannot read.
    #[error("Invalid remote response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// All records of `owner`, `createdAt` descending.
    async fn fetch_all(&self, owner: &IdentityId) -> Result<Vec<RemoteRecord>, GatewayError>;

    /// Set (create or overwrite) one record.
    async fn put(&self, owner: &IdentityId, record: &RemoteRecord) -> Result<(), GatewayError>;

    /// Set all `records` at once, or none of them.
    async fn put_batch(
        &self,
        owner: &IdentityId,
        records: &[RemoteRecord],
    ) -> Result<(), GatewayError>;

    /// Delete one record. Missing records are not an error.
    async fn delete(&self, owner: &IdentityId, id: &EntryId) -> Result<(), GatewayError>;
}
