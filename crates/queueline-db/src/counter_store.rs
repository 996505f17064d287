//! The ticket counter: one row, one monotonic integer.
//!
//! Every allocation is a read-increment-write inside a transaction that holds
//! a row lock (`SELECT ... FOR UPDATE`) on `counter.id = 1`. Concurrent
//! allocators queue on that lock, so no two of them ever read the same
//! pre-increment value.
//!
//! # Key Schema
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `id` | Always `1` |
//! | `value` | Last ticket number handed out (0 before the first) |

use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::postgres::finish;

/// Operations on the `counter` table.
pub struct CounterStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CounterStore<'a> {
    /// Create a new counter store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Allocate the next ticket number in its own transaction.
    ///
    /// Creates the counter row at 0 first if it is missing, so the first
    /// allocation on an empty table returns 1.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the transaction cannot be started,
    /// executed or committed; the counter is left unchanged in that case.
    /// Returns [`DbError::CounterOverflow`] if the counter is exhausted.
    pub async fn allocate_next(&self) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = allocate_in(&mut *tx).await;
        let number = finish(tx, result, "allocate_next").await?;
        tracing::debug!(ticket_number = number, "Allocated ticket number");
        Ok(number)
    }

    /// Read the last issued ticket number without modifying it.
    ///
    /// Returns `None` if the counter row does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn current(&self) -> Result<Option<u64>, DbError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM counter WHERE id = 1")
            .fetch_optional(self.pool)
            .await?;
        row.map(|(value,)| to_ticket(value)).transpose()
    }
}

/// Increment the counter on an open transaction and return the new value.
///
/// The row lock taken here is held until the caller commits or rolls back,
/// which lets the allocator insert the entry under the same lock.
pub(crate) async fn allocate_in(conn: &mut PgConnection) -> Result<u64, DbError> {
    let current = match lock_counter(conn).await? {
        Some(value) => value,
        None => {
            tracing::warn!("Counter row missing, initializing at 0");
            sqlx::query("INSERT INTO counter (id, value) VALUES (1, 0) ON CONFLICT (id) DO NOTHING")
                .execute(&mut *conn)
                .await?;
            // A concurrent initializer may have won the insert and already
            // allocated, so re-read under the lock instead of assuming 0.
            lock_counter(conn)
                .await?
                .ok_or_else(|| DbError::Corrupt("counter row vanished after insert".to_owned()))?
        }
    };

    let next = current.checked_add(1).ok_or(DbError::CounterOverflow)?;

    sqlx::query("UPDATE counter SET value = $1 WHERE id = 1")
        .bind(next)
        .execute(&mut *conn)
        .await?;

    to_ticket(next)
}

async fn lock_counter(conn: &mut PgConnection) -> Result<Option<i64>, DbError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM counter WHERE id = 1 FOR UPDATE")
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|(value,)| value))
}

fn to_ticket(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|e| DbError::Corrupt(format!("negative counter value {value}: {e}")))
}
