//! Request boundary for the Queueline walk-in queue service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for registration, listing, lookup, status changes,
//!   removal, summary counts and health
//! - **`WebSocket` endpoint** (`/ws/queue`) that streams committed changes
//!   to kiosk and staff dashboards via [`tokio::sync::broadcast`]
//!
//! # Architecture
//!
//! Handlers validate input, call the [`QueueBackend`](queueline_db::QueueBackend)
//! held in [`AppState`], and publish to the [`Notifier`] only after the
//! store call succeeds. The backend owns the ticket counter; this crate
//! never assigns numbers itself.

pub mod config;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{AppConfig, QueuePolicy};
pub use error::ApiError;
pub use notifier::Notifier;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
