//! Backend dispatch for the queue operations.
//!
//! Uses enum dispatch instead of trait objects because async methods are not
//! dyn-compatible. The request boundary holds one [`QueueBackend`] and never
//! needs to know which store sits behind it.

use std::sync::Arc;

use queueline_types::{EntryId, EntryStatus, QueueEntry, QueueSummary};

use crate::allocator::Allocator;
use crate::counter_store::CounterStore;
use crate::error::DbError;
use crate::memory::MemoryBackend;
use crate::postgres::PostgresPool;
use crate::queue_store::{GuardedWrite, QueueStore};

/// A queue store with its counter authority.
#[derive(Clone)]
pub enum QueueBackend {
    /// `PostgreSQL`-backed store (production).
    Postgres(PostgresPool),
    /// In-process store (tests, local runs).
    Memory(Arc<MemoryBackend>),
}

impl QueueBackend {
    /// Wrap a fresh in-memory store.
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryBackend::new()))
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Allocate the next ticket number without creating an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the counter transaction fails.
    pub async fn allocate_next(&self) -> Result<u64, DbError> {
        match self {
            Self::Postgres(pg) => CounterStore::new(pg.pool()).allocate_next().await,
            Self::Memory(mem) => mem.allocate_next().await,
        }
    }

    /// Register a customer: allocate a number and insert a waiting entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidName`] for a blank name, or another
    /// [`DbError`] if the store fails.
    pub async fn register(&self, name: &str) -> Result<QueueEntry, DbError> {
        match self {
            Self::Postgres(pg) => Allocator::new(pg.pool()).register(name).await,
            Self::Memory(mem) => mem.register(name).await,
        }
    }

    /// List every entry, ordered by ticket number ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn list_all(&self) -> Result<Vec<QueueEntry>, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).list_all().await,
            Self::Memory(mem) => Ok(mem.list_all().await),
        }
    }

    /// Look up the entry holding a ticket number.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn get_by_ticket_number(
        &self,
        ticket_number: u64,
    ) -> Result<Option<QueueEntry>, DbError> {
        match self {
            Self::Postgres(pg) => {
                QueueStore::new(pg.pool())
                    .get_by_ticket_number(ticket_number)
                    .await
            }
            Self::Memory(mem) => Ok(mem.get_by_ticket_number(ticket_number).await),
        }
    }

    /// Look up an entry by identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn get(&self, id: EntryId) -> Result<Option<QueueEntry>, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).get(id).await,
            Self::Memory(mem) => Ok(mem.get(id).await),
        }
    }

    /// Set an entry's status. Returns `false` if no entry has that id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn set_status(&self, id: EntryId, status: EntryStatus) -> Result<bool, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).set_status(id, status).await,
            Self::Memory(mem) => Ok(mem.set_status(id, status).await),
        }
    }

    /// Delete an entry. Returns `false` if no entry has that id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn remove(&self, id: EntryId) -> Result<bool, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).remove(id).await,
            Self::Memory(mem) => Ok(mem.remove(id).await),
        }
    }

    /// Set an entry's status unless that moves it backwards.
    ///
    /// The status check and the write are atomic with respect to other
    /// writers of the same entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn advance_status(
        &self,
        id: EntryId,
        status: EntryStatus,
    ) -> Result<GuardedWrite, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).advance_status(id, status).await,
            Self::Memory(mem) => Ok(mem.advance_status(id, status).await),
        }
    }

    /// Delete an entry only if it is done, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn remove_if_done(&self, id: EntryId) -> Result<GuardedWrite, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).remove_if_done(id).await,
            Self::Memory(mem) => Ok(mem.remove_if_done(id).await),
        }
    }

    /// Count entries per status.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn summary(&self) -> Result<QueueSummary, DbError> {
        match self {
            Self::Postgres(pg) => QueueStore::new(pg.pool()).summary().await,
            Self::Memory(mem) => Ok(mem.summary().await),
        }
    }

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be reached.
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            Self::Postgres(pg) => pg.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }
}
