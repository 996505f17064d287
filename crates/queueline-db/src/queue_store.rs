//! Persistence for queue entries.
//!
//! Each operation here touches a single row (or reads the whole table), so
//! none of them coordinate with each other. Ticket numbers arrive already
//! unique from the counter; the `UNIQUE` constraint on `ticket_number` is a
//! second line of defense.
//!
//! The store does not police status transitions: any status may be set from
//! any other with [`QueueStore::set_status`]. The guarded variants
//! ([`QueueStore::advance_status`], [`QueueStore::remove_if_done`]) lock the
//! row, check its current status and write in one transaction, so the check
//! cannot go stale before the write lands.

use chrono::{DateTime, Utc};
use queueline_types::{EntryId, EntryStatus, QueueEntry, QueueSummary};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::finish;

/// Columns selected for every entry read, with the status enum cast to text.
const ENTRY_COLUMNS: &str = "id, ticket_number, name, status::TEXT AS status, created_at";

/// Result of a write that is conditional on the entry's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedWrite {
    /// The condition held and the write was committed.
    Applied,
    /// No entry has that id.
    NotFound,
    /// The entry exists but its status refused the write; nothing changed.
    Refused(EntryStatus),
}

/// Operations on the `entries` table.
pub struct QueueStore<'a> {
    pool: &'a PgPool,
}

impl<'a> QueueStore<'a> {
    /// Create a new queue store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every entry, ordered by ticket number ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if a row cannot be decoded.
    pub async fn list_all(&self) -> Result<Vec<QueueEntry>, DbError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY ticket_number ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(QueueEntry::try_from).collect()
    }

    /// Look up the entry holding a ticket number.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_by_ticket_number(
        &self,
        ticket_number: u64,
    ) -> Result<Option<QueueEntry>, DbError> {
        // Numbers beyond i64 were never issued, so they cannot match.
        let Ok(ticket_i64) = i64::try_from(ticket_number) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE ticket_number = $1"
        ))
        .bind(ticket_i64)
        .fetch_optional(self.pool)
        .await?;

        row.map(QueueEntry::try_from).transpose()
    }

    /// Look up an entry by identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: EntryId) -> Result<Option<QueueEntry>, DbError> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(QueueEntry::try_from).transpose()
    }

    /// Set an entry's status. Returns `false` if no entry has that id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn set_status(&self, id: EntryId, status: EntryStatus) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE entries SET status = $1::entry_status WHERE id = $2")
            .bind(status.as_db_str())
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;

        let updated = result.rows_affected() > 0;
        tracing::debug!(%id, status = status.as_str(), updated, "Set entry status");
        Ok(updated)
    }

    /// Delete an entry. Returns `false` if no entry has that id.
    ///
    /// The entry's ticket number is not returned to the counter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn remove(&self, id: EntryId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        tracing::debug!(%id, removed, "Removed entry");
        Ok(removed)
    }

    /// Set an entry's status unless that moves it backwards in the lifecycle.
    ///
    /// Setting the current status again is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the transaction fails; nothing is
    /// written in that case.
    pub async fn advance_status(
        &self,
        id: EntryId,
        status: EntryStatus,
    ) -> Result<GuardedWrite, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = advance_in(&mut *tx, id, status).await;
        let outcome = finish(tx, result, "advance_status").await?;
        tracing::debug!(%id, status = status.as_str(), ?outcome, "Advanced entry status");
        Ok(outcome)
    }

    /// Delete an entry only if it is done.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the transaction fails; nothing is
    /// deleted in that case.
    pub async fn remove_if_done(&self, id: EntryId) -> Result<GuardedWrite, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = remove_done_in(&mut *tx, id).await;
        let outcome = finish(tx, result, "remove_if_done").await?;
        tracing::debug!(%id, ?outcome, "Removed done entry");
        Ok(outcome)
    }

    /// Count entries per status in one query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn summary(&self) -> Result<QueueSummary, DbError> {
        let (total, waiting, in_progress, done): (i64, i64, i64, i64) = sqlx::query_as(
            r"SELECT COUNT(*),
                     COUNT(*) FILTER (WHERE status = 'waiting'),
                     COUNT(*) FILTER (WHERE status = 'in_progress'),
                     COUNT(*) FILTER (WHERE status = 'done')
              FROM entries",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(QueueSummary {
            total: to_count(total)?,
            waiting: to_count(waiting)?,
            in_progress: to_count(in_progress)?,
            done: to_count(done)?,
        })
    }
}

/// Insert a waiting entry on an open transaction.
pub(crate) async fn insert_in(
    conn: &mut PgConnection,
    name: &str,
    ticket_number: u64,
) -> Result<QueueEntry, DbError> {
    let ticket_i64 = i64::try_from(ticket_number).map_err(|e| {
        DbError::Corrupt(format!("ticket number {ticket_number} out of range: {e}"))
    })?;

    let row = sqlx::query_as::<_, EntryRow>(&format!(
        "INSERT INTO entries (name, ticket_number, status)
         VALUES ($1, $2, 'waiting')
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(name)
    .bind(ticket_i64)
    .fetch_one(&mut *conn)
    .await?;

    QueueEntry::try_from(row)
}

async fn advance_in(
    conn: &mut PgConnection,
    id: EntryId,
    status: EntryStatus,
) -> Result<GuardedWrite, DbError> {
    let Some(current) = lock_status(conn, id).await? else {
        return Ok(GuardedWrite::NotFound);
    };
    if status.is_regression_from(current) {
        return Ok(GuardedWrite::Refused(current));
    }

    sqlx::query("UPDATE entries SET status = $1::entry_status WHERE id = $2")
        .bind(status.as_db_str())
        .bind(id.into_inner())
        .execute(&mut *conn)
        .await?;
    Ok(GuardedWrite::Applied)
}

async fn remove_done_in(conn: &mut PgConnection, id: EntryId) -> Result<GuardedWrite, DbError> {
    let Some(current) = lock_status(conn, id).await? else {
        return Ok(GuardedWrite::NotFound);
    };
    if current != EntryStatus::Done {
        return Ok(GuardedWrite::Refused(current));
    }

    sqlx::query("DELETE FROM entries WHERE id = $1")
        .bind(id.into_inner())
        .execute(&mut *conn)
        .await?;
    Ok(GuardedWrite::Applied)
}

/// Read an entry's status and hold its row lock until the transaction ends.
async fn lock_status(conn: &mut PgConnection, id: EntryId) -> Result<Option<EntryStatus>, DbError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT status::TEXT FROM entries WHERE id = $1 FOR UPDATE")
            .bind(id.into_inner())
            .fetch_optional(&mut *conn)
            .await?;

    row.map(|(label,)| {
        EntryStatus::from_db_str(&label)
            .ok_or_else(|| DbError::Corrupt(format!("entry {id} has status {label:?}")))
    })
    .transpose()
}

fn to_count(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|e| DbError::Corrupt(format!("negative count {value}: {e}")))
}

/// A row from the `entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRow {
    /// Entry UUID.
    pub id: Uuid,
    /// Ticket number (always positive).
    pub ticket_number: i64,
    /// Display name.
    pub name: String,
    /// Status as a string (cast from the `PostgreSQL` enum).
    pub status: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for QueueEntry {
    type Error = DbError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let ticket_number = u64::try_from(row.ticket_number)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                DbError::Corrupt(format!(
                    "entry {} has ticket number {}",
                    row.id, row.ticket_number
                ))
            })?;
        let status = EntryStatus::from_db_str(&row.status).ok_or_else(|| {
            DbError::Corrupt(format!("entry {} has status {:?}", row.id, row.status))
        })?;

        Ok(Self {
            id: EntryId::from(row.id),
            ticket_number,
            name: row.name,
            status,
            created_at: row.created_at,
        })
    }
}
