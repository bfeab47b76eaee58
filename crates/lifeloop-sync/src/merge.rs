//! Pure reconciliation rules: the date-keyed merge and guest migration.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::NaiveDate;

use lifeloop_shared::types::sort_newest_first;
use lifeloop_shared::{IdentityId, JournalEntry};

/// Merge local entries with remote ones, last writer wins per calendar date.
///
/// For a date present on both sides the entry with the strictly greater
/// `created_at` is kept; ties keep the local entry. Remote-only dates are
/// added. Entries are matched by `date`, not `id`, so two different ids on
/// the same day collapse into one and the older is dropped. The result is
/// sorted newest first.
pub fn merge_by_date(local: Vec<JournalEntry>, remote: Vec<JournalEntry>) -> Vec<JournalEntry> {
    // Remote should already be unique per date; if not, its newest wins.
    let mut remote_by_date: HashMap<NaiveDate, JournalEntry> = HashMap::with_capacity(remote.len());
    let mut remote_order: Vec<NaiveDate> = Vec::with_capacity(remote.len());
    for entry in remote {
        match remote_by_date.entry(entry.date) {
            Entry::Occupied(mut slot) => {
                if entry.created_at > slot.get().created_at {
                    slot.insert(entry);
                }
            }
            Entry::Vacant(slot) => {
                remote_order.push(entry.date);
                slot.insert(entry);
            }
        }
    }

    let mut merged = Vec::with_capacity(local.len() + remote_by_date.len());
    for entry in local {
        match remote_by_date.remove(&entry.date) {
            Some(remote) if remote.created_at > entry.created_at => merged.push(remote),
            _ => merged.push(entry),
        }
    }

    merged.extend(
        remote_order
            .into_iter()
            .filter_map(|date| remote_by_date.remove(&date)),
    );

    sort_newest_first(&mut merged);
    merged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub entries: Vec<JournalEntry>,
    /// Entries whose owner actually changed.
    pub migrated_count: usize,
}

/// Re-tag guest-owned and unowned entries with `new_id`.
///
/// Entries owned by any other identity are left alone. Running it again
/// after a successful migration changes nothing.
pub fn migrate_guest_entries(
    guest_id: &IdentityId,
    new_id: &IdentityId,
    entries: Vec<JournalEntry>,
) -> MigrationOutcome {
    let mut migrated_count = 0;
    let entries = entries
        .into_iter()
        .map(|mut entry| {
            let claimable = match &entry.owner_id {
                None => true,
                Some(owner) => owner == guest_id && owner != new_id,
            };
            if claimable {
                entry.owner_id = Some(new_id.clone());
                migrated_count += 1;
            }
            entry
        })
        .collect();

    MigrationOutcome {
        entries,
        migrated_count,
    }
}

/// The entries `owner` may mirror into its collection: its own, plus those
/// nobody owns yet. Guest-owned entries and entries of other identities are
/// left out.
pub fn pushable_entries(owner: &IdentityId, entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    entries
        .into_iter()
        .filter(|e| e.owner_id.is_none() || e.is_owned_by(owner))
        .collect()
}
