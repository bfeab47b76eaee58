use thiserror::Error;

/// Reasons an [`EntryDraft`](crate::types::EntryDraft) cannot become an entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("Caption too long: {len} characters (max {max})")]
    CaptionTooLong { len: usize, max: usize },

    #[error("Entry has no image")]
    EmptyImageUri,
}
