//! # lifeloop-sync
//!
//! Reconciliation between the device's [`EntryStore`] and the signed-in
//! identity's remote collection.
//!
//! - **gateway**: the Remote Collection Gateway contract, with an in-memory
//!   and an HTTP implementation
//! - **merge**: the date-keyed last-writer-wins merge and guest migration
//! - **service**: [`SyncService`], the remote half of every flow
//! - **journal**: [`Journal`], the flows the app calls (load, save, delete,
//!   force sync, sign-in migration, guest mode)
//!
//! No global "current user" exists: callers build a [`SessionContext`] from
//! the identity provider's signal and pass it to every call.
//!
//! [`EntryStore`]: lifeloop_store::EntryStore

pub mod config;
pub mod gateway;
pub mod journal;
pub mod merge;
pub mod service;
pub mod session;

mod error;

pub use config::ClientConfig;
pub use error::SyncError;
pub use gateway::{GatewayError, HttpGateway, MemoryGateway, RemoteGateway};
pub use journal::Journal;
pub use merge::{merge_by_date, migrate_guest_entries, pushable_entries, MigrationOutcome};
pub use service::SyncService;
pub use session::SessionContext;
