//! Customer registration: allocate a ticket number and record the entry.
//!
//! Allocation and insertion share one transaction. The counter row lock
//! taken by the increment is held until the entry insert commits, and a
//! failed insert rolls the counter back with it. Ticket numbers therefore
//! stay dense: no number is consumed without an entry to show for it.
//!
//! ```text
//! BEGIN
//!   SELECT value FROM counter WHERE id = 1 FOR UPDATE   -- serializes allocators
//!   UPDATE counter SET value = value + 1
//!   INSERT INTO entries (name, ticket_number, 'waiting')
//! COMMIT                                                -- or ROLLBACK on any error
//! ```

use queueline_types::{QueueEntry, normalize_name};
use sqlx::PgPool;

use crate::counter_store::allocate_in;
use crate::error::DbError;
use crate::postgres::finish;
use crate::queue_store::insert_in;

/// Registers customers against a `PostgreSQL` pool.
pub struct Allocator<'a> {
    pool: &'a PgPool,
}

impl<'a> Allocator<'a> {
    /// Create a new allocator bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register `name` and return the new waiting entry.
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidName`] if the name is blank (nothing is
    /// allocated). Returns [`DbError::Postgres`] if any step fails; the
    /// transaction is rolled back and the counter keeps its previous value.
    pub async fn register(&self, name: &str) -> Result<QueueEntry, DbError> {
        let name = normalize_name(name).ok_or(DbError::InvalidName)?;

        let mut tx = self.pool.begin().await?;
        let result = async {
            let ticket_number = allocate_in(&mut *tx).await?;
            insert_in(&mut *tx, name, ticket_number).await
        }
        .await;
        let entry = finish(tx, result, "register").await?;

        tracing::info!(
            id = %entry.id,
            ticket_number = entry.ticket_number,
            "Registered queue entry"
        );
        tracing::debug!(id = %entry.id, name = entry.name.as_str(), "Registered name");

        Ok(entry)
    }
}
