//! REST API endpoint handlers.
//!
//! Every handler validates its input before touching the store, and
//! publishes to the notifier only after the store call has returned
//! successfully, so observers never hear about an uncommitted change.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/queue` | Register a customer |
//! | `GET` | `/api/queues` | List all entries by ticket number |
//! | `GET` | `/api/queues/summary` | Per-status counts |
//! | `GET` | `/api/queue/{number}` | Look up an entry by ticket number |
//! | `PUT` | `/api/queue/{id}/status` | Change an entry's status |
//! | `DELETE` | `/api/queue/{id}` | Remove an entry |
//! | `GET` | `/api/health` | Store connectivity check |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use queueline_db::GuardedWrite;
use queueline_types::{EntryId, EntryStatus, QueueEvent, Registration, normalize_name};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/queue`.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterRequest {
    /// Customer display name. Required and non-blank.
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for `PUT /api/queue/{id}/status`.
#[derive(Debug, serde::Deserialize)]
pub struct SetStatusRequest {
    /// One of `waiting`, `in-progress`, `done`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct SuccessResponse {
    success: bool,
}

// ---------------------------------------------------------------------------
// POST /api/queue
// ---------------------------------------------------------------------------

/// Register a customer and return their ticket.
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let name = request
        .name
        .as_deref()
        .and_then(normalize_name)
        .ok_or_else(|| ApiError::Validation(String::from("name is required")))?;

    let entry = state.backend.register(name).await?;
    state.notifier.publish(QueueEvent::EntryListChanged);

    Ok((StatusCode::CREATED, Json(Registration::from(&entry))))
}

// ---------------------------------------------------------------------------
// GET /api/queues, GET /api/queues/summary
// ---------------------------------------------------------------------------

/// List every entry ordered by ticket number.
pub async fn list_queues(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.backend.list_all().await?))
}

/// Count entries per status.
pub async fn queue_summary(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.backend.summary().await?))
}

// ---------------------------------------------------------------------------
// GET /api/queue/{number}
// ---------------------------------------------------------------------------

/// Look up an entry by its ticket number.
pub async fn get_by_ticket(
    State(state): State<Arc<AppState>>,
    Path(number_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let number: u64 = number_str
        .trim()
        .parse()
        .map_err(|e| ApiError::Validation(format!("invalid ticket number {number_str:?}: {e}")))?;

    let entry = state
        .backend
        .get_by_ticket_number(number)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ticket {number} not found")))?;

    Ok(Json(entry))
}

// ---------------------------------------------------------------------------
// PUT /api/queue/{id}/status
// ---------------------------------------------------------------------------

/// Change an entry's status.
///
/// With `enforce_forward_transitions` on, moving an entry backwards in the
/// lifecycle is refused with 409.
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    body: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_entry_id(&id_str)?;
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let status: EntryStatus = request
        .status
        .as_deref()
        .ok_or_else(|| ApiError::Validation(String::from("status is required")))?
        .parse()
        .map_err(|e: queueline_types::ParseStatusError| ApiError::Validation(e.to_string()))?;

    if state.policy.enforce_forward_transitions {
        match state.backend.advance_status(id, status).await? {
            GuardedWrite::Applied => {}
            GuardedWrite::NotFound => return Err(not_found(id)),
            GuardedWrite::Refused(current) => {
                return Err(ApiError::Conflict(format!(
                    "cannot move entry {id} from {current} back to {status}"
                )));
            }
        }
    } else if !state.backend.set_status(id, status).await? {
        return Err(not_found(id));
    }
    state
        .notifier
        .publish(QueueEvent::StatusChanged { id, status });

    Ok(Json(SuccessResponse { success: true }))
}

// ---------------------------------------------------------------------------
// DELETE /api/queue/{id}
// ---------------------------------------------------------------------------

/// Remove an entry. Its ticket number is never reissued.
///
/// With `require_done_before_remove` on, entries that are not done are
/// refused with 409.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_entry_id(&id_str)?;

    if state.policy.require_done_before_remove {
        match state.backend.remove_if_done(id).await? {
            GuardedWrite::Applied => {}
            GuardedWrite::NotFound => return Err(not_found(id)),
            GuardedWrite::Refused(current) => {
                return Err(ApiError::Conflict(format!(
                    "entry {id} is {current}, only done entries may be removed"
                )));
            }
        }
    } else if !state.backend.remove(id).await? {
        return Err(not_found(id));
    }
    state.notifier.publish(QueueEvent::EntryListChanged);

    Ok(Json(SuccessResponse { success: true }))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report whether the store is reachable.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.backend.ping().await.map_err(ApiError::Unavailable)?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "backend": state.backend.name(),
        "observers": state.notifier.observer_count(),
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_entry_id(s: &str) -> Result<EntryId, ApiError> {
    s.parse()
        .map_err(|e| ApiError::Validation(format!("invalid entry id {s:?}: {e}")))
}

fn not_found(id: EntryId) -> ApiError {
    ApiError::NotFound(format!("entry {id} not found"))
}
