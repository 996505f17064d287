//! Error types for the storage layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors and adds the queue-specific failure modes.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed (connection, query, or commit).
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A registration was attempted with a blank display name.
    #[error("display name must not be empty")]
    InvalidName,

    /// The ticket counter cannot be incremented any further.
    #[error("ticket counter exhausted")]
    CounterOverflow,

    /// A stored row violates the queue's invariants.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl DbError {
    /// Whether the error was caused by the caller's input rather than the store.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidName)
    }
}
