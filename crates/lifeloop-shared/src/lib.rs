//! # lifeloop-shared
//!
//! Data model shared by every LifeLoop crate: journal entries and their remote
//! mirror records, the identity model, the mood vocabulary and the storage /
//! wire constants both the device and the server agree on.

pub mod constants;
pub mod error;
pub mod identity;
pub mod mood;
pub mod types;

pub use error::EntryError;
pub use identity::{generate_guest_id, AuthProvider, Identity};
pub use mood::{mood_color, Mood, MoodStyle};
pub use types::{
    now_millis, sort_newest_first, EntryDraft, EntryId, IdentityId, JournalEntry, RemoteRecord,
};
