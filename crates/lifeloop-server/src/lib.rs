//! # lifeloop-server
//!
//! HTTP backend for the remote entry collections.
//!
//! - **api**: axum router for `/health` and `/users/:uid/entries[...]`
//! - **collections**: one JSON file per identity, atomic batch writes
//! - **config**: environment-driven settings
//!
//! Every identity only ever reads and writes its own collection; the path
//! `uid` picks the file and each written record must carry the same `userId`.

pub mod api;
pub mod collections;
pub mod config;
pub mod error;

pub use api::{build_router, serve, AppState};
pub use collections::CollectionStore;
pub use config::ServerConfig;
pub use error::ServerError;
