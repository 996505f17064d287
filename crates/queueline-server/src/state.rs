//! Shared application state for the request boundary.
//!
//! [`AppState`] bundles the queue backend, the notifier observers subscribe
//! to, and the boundary policies. It is wrapped in [`Arc`] and injected into
//! every handler through Axum's `State` extractor.

use std::sync::Arc;

use queueline_db::QueueBackend;

use crate::config::QueuePolicy;
use crate::notifier::Notifier;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The store behind every queue operation.
    pub backend: QueueBackend,
    /// Broadcast of committed changes to `WebSocket` observers.
    pub notifier: Notifier,
    /// Optional status and removal policies.
    pub policy: QueuePolicy,
}

impl AppState {
    /// Create state over `backend` with default policies.
    pub fn new(backend: QueueBackend) -> Self {
        Self {
            backend,
            notifier: Notifier::new(),
            policy: QueuePolicy::default(),
        }
    }

    /// Replace the boundary policies.
    #[must_use]
    pub const fn with_policy(mut self, policy: QueuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// In-memory state for tests and local runs.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::new(QueueBackend::memory()))
    }
}
