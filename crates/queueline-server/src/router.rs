//! Axum router construction.
//!
//! Assembles the REST and `WebSocket` routes into a single [`Router`]
//! with permissive CORS for the kiosk and staff dashboards.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `POST /api/queue` -- register a customer
/// - `GET /api/queues` -- list entries by ticket number
/// - `GET /api/queues/summary` -- per-status counts
/// - `GET /api/queue/{number}` -- look up a ticket
/// - `PUT /api/queue/{id}/status` -- change status
/// - `DELETE /api/queue/{id}` -- remove an entry
/// - `GET /api/health` -- store connectivity
/// - `GET /ws/queue` -- live change stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/queue", get(ws::ws_queue))
        .route("/api/health", get(handlers::health))
        .route("/api/queue", post(handlers::register))
        .route("/api/queues", get(handlers::list_queues))
        .route("/api/queues/summary", get(handlers::queue_summary))
        // GET takes a ticket number here, DELETE an entry id.
        .route(
            "/api/queue/{id}",
            get(handlers::get_by_ticket).delete(handlers::remove),
        )
        .route("/api/queue/{id}/status", put(handlers::set_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
