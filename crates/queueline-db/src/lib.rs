//! Storage layer for the Queueline walk-in queue service.
//!
//! `PostgreSQL` is the single ticket-counter authority and the system of
//! record for queue entries. An in-process backend with the same contract
//! exists for tests and local runs.
//!
//! # Architecture
//!
//! ```text
//! QueueBackend (enum dispatch)
//!     |
//!     +-- Postgres (PostgresPool)
//!     |     |-- Allocator     (counter + insert in one transaction)
//!     |     |-- CounterStore  (row-locked read-increment-write)
//!     |     +-- QueueStore    (list, lookup, status, remove, summary)
//!     |
//!     +-- Memory (MemoryBackend, one mutex over counter + entries)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`counter_store`] -- The ticket counter
//! - [`queue_store`] -- Queue entry persistence
//! - [`allocator`] -- Customer registration
//! - [`memory`] -- In-process backend
//! - [`backend`] -- Dispatch over the two backends
//! - [`error`] -- Shared error types

pub mod allocator;
pub mod backend;
pub mod counter_store;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod queue_store;

// Re-export primary types for convenience.
pub use allocator::Allocator;
pub use backend::QueueBackend;
pub use counter_store::CounterStore;
pub use error::DbError;
pub use memory::MemoryBackend;
pub use postgres::{PostgresConfig, PostgresPool};
pub use queue_store::{EntryRow, GuardedWrite, QueueStore};
