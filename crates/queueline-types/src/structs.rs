//! Queue entries and the projections built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EntryStatus;
use crate::ids::EntryId;

/// One customer's queue registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueEntry {
    /// Store-assigned identity.
    pub id: EntryId,
    /// Customer-visible ticket number. Positive, unique, never reused.
    pub ticket_number: u64,
    /// Display name supplied at registration.
    pub name: String,
    /// Current lifecycle stage.
    pub status: EntryStatus,
    /// Insert time, immutable.
    pub created_at: DateTime<Utc>,
}

/// What a customer receives after registering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Registration {
    /// Identity of the new entry.
    pub id: EntryId,
    /// The allocated ticket number.
    pub ticket_number: u64,
    /// The registered display name.
    pub name: String,
}

impl From<&QueueEntry> for Registration {
    fn from(entry: &QueueEntry) -> Self {
        Self {
            id: entry.id,
            ticket_number: entry.ticket_number,
            name: entry.name.clone(),
        }
    }
}

/// Per-status counts over the current queue, shown on the staff page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueSummary {
    /// Number of entries in the queue.
    pub total: u64,
    /// Entries still waiting.
    pub waiting: u64,
    /// Entries being served.
    pub in_progress: u64,
    /// Finished entries not yet removed.
    pub done: u64,
}

impl QueueSummary {
    /// Count entries by status.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a QueueEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, entry| {
            acc.total = acc.total.saturating_add(1);
            let slot = match entry.status {
                EntryStatus::Waiting => &mut acc.waiting,
                EntryStatus::InProgress => &mut acc.in_progress,
                EntryStatus::Done => &mut acc.done,
            };
            *slot = slot.saturating_add(1);
            acc
        })
    }
}

/// Trim a customer-supplied display name, rejecting blank input.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
