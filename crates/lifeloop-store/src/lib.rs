//! # lifeloop-store
//!
//! Device-local persistence for LifeLoop.
//!
//! Everything the device keeps lives in a small key-value store: the journal
//! entries as one JSON block, the guest pseudo-id and the guest-mode flag.
//! The crate exposes the [`KeyValueStore`] contract with a SQLite-backed
//! [`Database`] and an in-process [`MemoryStore`], and builds the
//! [`EntryStore`] and [`GuestSession`] on top of it.

pub mod database;
pub mod entries;
pub mod guest;
pub mod kv;
pub mod migrations;

mod error;

pub use database::Database;
pub use entries::EntryStore;
pub use error::{Result, StoreError};
pub use guest::GuestSession;
pub use kv::{KeyValueStore, MemoryStore};
