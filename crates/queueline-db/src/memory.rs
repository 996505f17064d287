//! In-process queue backend.
//!
//! Holds the counter and all entries behind one [`tokio::sync::Mutex`]. It is
//! a single-process counter authority: suitable for tests and local runs,
//! not for several server instances sharing one queue.
//!
//! Entries are keyed by ticket number, so iteration order is already the
//! listing order.

use std::collections::BTreeMap;

use chrono::Utc;
use queueline_types::{EntryId, EntryStatus, QueueEntry, QueueSummary, normalize_name};
use tokio::sync::Mutex;

use crate::error::DbError;
use crate::queue_store::GuardedWrite;

#[derive(Debug, Default)]
struct MemoryState {
    /// Last issued ticket number; `None` until the counter is initialized.
    counter: Option<u64>,
    entries: BTreeMap<u64, QueueEntry>,
}

impl MemoryState {
    fn allocate(&mut self) -> Result<u64, DbError> {
        let current = *self.counter.get_or_insert_with(|| {
            tracing::warn!("Counter missing, initializing at 0");
            0
        });
        let next = current.checked_add(1).ok_or(DbError::CounterOverflow)?;
        self.counter = Some(next);
        Ok(next)
    }

    fn find_mut(&mut self, id: EntryId) -> Option<&mut QueueEntry> {
        self.entries.values_mut().find(|entry| entry.id == id)
    }
}

/// Queue state stored in process memory.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty backend with the counter initialized to 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                counter: Some(0),
                entries: BTreeMap::new(),
            }),
        }
    }

    /// Create an empty backend whose counter has not been initialized yet.
    ///
    /// The first allocation creates it, exactly as the `PostgreSQL` store
    /// does when the counter row is missing.
    pub fn without_counter() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Allocate the next ticket number without creating an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CounterOverflow`] if the counter is exhausted.
    pub async fn allocate_next(&self) -> Result<u64, DbError> {
        self.state.lock().await.allocate()
    }

    /// Read the last issued ticket number.
    pub async fn current(&self) -> Option<u64> {
        self.state.lock().await.counter
    }

    /// Register `name` as a new waiting entry.
    ///
    /// The lock is held across allocation and insertion.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidName`] for a blank name, or
    /// [`DbError::CounterOverflow`] if the counter is exhausted.
    pub async fn register(&self, name: &str) -> Result<QueueEntry, DbError> {
        let name = normalize_name(name).ok_or(DbError::InvalidName)?;

        let mut state = self.state.lock().await;
        let ticket_number = state.allocate()?;
        let entry = QueueEntry {
            id: EntryId::new(),
            ticket_number,
            name: name.to_owned(),
            status: EntryStatus::Waiting,
            created_at: Utc::now(),
        };
        state.entries.insert(ticket_number, entry.clone());
        drop(state);

        tracing::info!(id = %entry.id, ticket_number, "Registered queue entry");
        tracing::debug!(id = %entry.id, name = entry.name.as_str(), "Registered name");
        Ok(entry)
    }

    /// List every entry, ordered by ticket number ascending.
    pub async fn list_all(&self) -> Vec<QueueEntry> {
        self.state.lock().await.entries.values().cloned().collect()
    }

    /// Look up the entry holding a ticket number.
    pub async fn get_by_ticket_number(&self, ticket_number: u64) -> Option<QueueEntry> {
        self.state.lock().await.entries.get(&ticket_number).cloned()
    }

    /// Look up an entry by identity.
    pub async fn get(&self, id: EntryId) -> Option<QueueEntry> {
        self.state.lock().await.find_mut(id).cloned()
    }

    /// Set an entry's status. Returns `false` if no entry has that id.
    pub async fn set_status(&self, id: EntryId, status: EntryStatus) -> bool {
        let mut state = self.state.lock().await;
        let updated = match state.find_mut(id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        };
        drop(state);

        tracing::debug!(%id, status = status.as_str(), updated, "Set entry status");
        updated
    }

    /// Delete an entry. Returns `false` if no entry has that id.
    pub async fn remove(&self, id: EntryId) -> bool {
        let mut state = self.state.lock().await;
        let ticket = state.find_mut(id).map(|entry| entry.ticket_number);
        let removed = ticket.and_then(|n| state.entries.remove(&n)).is_some();
        drop(state);

        tracing::debug!(%id, removed, "Removed entry");
        removed
    }

    /// Set an entry's status unless that moves it backwards in the lifecycle.
    ///
    /// The check and the write happen under one lock acquisition.
    pub async fn advance_status(&self, id: EntryId, status: EntryStatus) -> GuardedWrite {
        let mut state = self.state.lock().await;
        let outcome = match state.find_mut(id) {
            None => GuardedWrite::NotFound,
            Some(entry) if status.is_regression_from(entry.status) => {
                GuardedWrite::Refused(entry.status)
            }
            Some(entry) => {
                entry.status = status;
                GuardedWrite::Applied
            }
        };
        drop(state);

        tracing::debug!(%id, status = status.as_str(), ?outcome, "Advanced entry status");
        outcome
    }

    /// Delete an entry only if it is done.
    pub async fn remove_if_done(&self, id: EntryId) -> GuardedWrite {
        let mut state = self.state.lock().await;
        let outcome = match state.find_mut(id).map(|e| (e.ticket_number, e.status)) {
            None => GuardedWrite::NotFound,
            Some((ticket_number, EntryStatus::Done)) => {
                state.entries.remove(&ticket_number);
                GuardedWrite::Applied
            }
            Some((_, current)) => GuardedWrite::Refused(current),
        };
        drop(state);

        tracing::debug!(%id, ?outcome, "Removed done entry");
        outcome
    }

    /// Count entries per status.
    pub async fn summary(&self) -> QueueSummary {
        QueueSummary::from_entries(self.state.lock().await.entries.values())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
