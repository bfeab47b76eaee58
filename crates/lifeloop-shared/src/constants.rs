/// Key-value key holding the JSON array of journal entries
pub const ENTRIES_KEY: &str = "lifeloop.entries";

/// Key-value key holding the persistent guest pseudo-id
pub const GUEST_USER_ID_KEY: &str = "@guest_user_id";

/// Key-value key set to "true" while guest mode is active
pub const GUEST_MODE_KEY: &str = "@guest_mode";

/// Prefix of every generated guest id
pub const GUEST_ID_PREFIX: &str = "guest_";

/// Number of random characters after the guest prefix
pub const GUEST_ID_RANDOM_LEN: usize = 21;

/// Maximum caption length in characters (after trimming)
pub const MAX_CAPTION_CHARS: usize = 100;

/// Remote collection name under each identity
pub const ENTRIES_COLLECTION: &str = "entries";

/// Maximum number of records in one atomic batch write
pub const MAX_BATCH_SIZE: usize = 500;

/// Maximum identity id length accepted by the server
pub const MAX_IDENTITY_ID_LEN: usize = 128;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Color used when an entry has no (known) mood
pub const FALLBACK_MOOD_COLOR: &str = "#966f51";
