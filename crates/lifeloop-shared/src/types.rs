use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_CAPTION_CHARS;
use crate::error::EntryError;
use crate::mood::Mood;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Opaque entry identifier, generated on the device when the entry is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Guest pseudo-id or authenticated identity id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One memory for one calendar day.
///
/// `id` is the durable identity of the entry; `date` is a uniqueness
/// constraint enforced by the local store at write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub image_uri: String,
    pub caption: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    /// Older blocks stored the owner under `userId`.
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<IdentityId>,
}

impl JournalEntry {
    pub fn is_owned_by(&self, owner: &IdentityId) -> bool {
        self.owner_id.as_ref() == Some(owner)
    }
}

/// Sort newest first by `created_at`. Stable, so equal timestamps keep their
/// relative order.
pub fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// The user-editable part of an entry, as captured by the "today" form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub image_uri: String,
    pub caption: String,
    #[serde(default)]
    pub mood: Option<Mood>,
}

impl EntryDraft {
    /// Turn the draft into a full entry.
    ///
    /// When `existing` is the stored entry for the same date its `id` and
    /// `created_at` are kept, so editing a day's memory updates it in place.
    pub fn into_entry(
        self,
        existing: Option<&JournalEntry>,
        owner: Option<&IdentityId>,
        now_ms: i64,
    ) -> Result<JournalEntry, EntryError> {
        let caption = self.caption.trim().to_string();
        let len = caption.chars().count();
        if len > MAX_CAPTION_CHARS {
            return Err(EntryError::CaptionTooLong {
                len,
                max: MAX_CAPTION_CHARS,
            });
        }
        if self.image_uri.trim().is_empty() {
            return Err(EntryError::EmptyImageUri);
        }

        let existing = existing.filter(|e| e.date == self.date);
        let (id, created_at) = match existing {
            Some(e) => (e.id.clone(), e.created_at),
            None => (EntryId::generate(), now_ms),
        };

        Ok(JournalEntry {
            id,
            date: self.date,
            image_uri: self.image_uri,
            caption,
            created_at,
            mood: self.mood,
            owner_id: owner.cloned(),
        })
    }
}

/// Server-side mirror of a [`JournalEntry`] inside one identity's collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    #[serde(flatten)]
    pub entry: JournalEntry,
    /// Identity whose collection holds this record.
    pub user_id: IdentityId,
    /// Epoch milliseconds of the last write.
    pub synced_at: i64,
}

impl RemoteRecord {
    pub fn new(entry: JournalEntry, user_id: IdentityId, synced_at: i64) -> Self {
        Self {
            entry,
            user_id,
            synced_at,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.entry.id
    }

    pub fn into_entry(self) -> JournalEntry {
        self.entry
    }
}
