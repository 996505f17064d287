//! Integration tests for the Queueline API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over the in-memory backend.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use queueline_server::router::build_router;
use queueline_server::{AppState, QueuePolicy};
use queueline_types::{EntryStatus, QueueEvent};
use serde_json::Value;
use tower::ServiceExt;

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn register(state: &Arc<AppState>, name: &str) -> Value {
    let (status, json) = send(
        state,
        json_request("POST", "/api/queue", &serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

async fn set_status(state: &Arc<AppState>, id: &str, status: &str) -> (StatusCode, Value) {
    send(
        state,
        json_request(
            "PUT",
            &format!("/api/queue/{id}/status"),
            &serde_json::json!({ "status": status }),
        ),
    )
    .await
}

fn policy_state(policy: QueuePolicy) -> Arc<AppState> {
    Arc::new(AppState::new(queueline_db::QueueBackend::memory()).with_policy(policy))
}

// =========================================================================
// POST /api/queue
// =========================================================================

#[tokio::test]
async fn register_issues_sequential_tickets() {
    let state = AppState::in_memory();

    let alice = register(&state, "Alice").await;
    assert_eq!(alice["ticket_number"], 1);
    assert_eq!(alice["name"], "Alice");
    assert!(alice["id"].is_string());

    let bob = register(&state, "Bob").await;
    assert_eq!(bob["ticket_number"], 2);
    assert_ne!(alice["id"], bob["id"]);
}

#[tokio::test]
async fn register_trims_surrounding_whitespace() {
    let state = AppState::in_memory();
    let entry = register(&state, "  Carol  ").await;
    assert_eq!(entry["name"], "Carol");
}

#[tokio::test]
async fn register_rejects_blank_or_missing_name() {
    let state = AppState::in_memory();

    for body in [
        serde_json::json!({ "name": "" }),
        serde_json::json!({ "name": "   " }),
        serde_json::json!({}),
        serde_json::json!({ "name": null }),
    ] {
        let (status, json) = send(&state, json_request("POST", "/api/queue", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["status"], 400);
    }

    // No number was consumed by the rejected requests.
    let first = register(&state, "Dana").await;
    assert_eq!(first["ticket_number"], 1);
}

#[tokio::test]
async fn register_rejects_malformed_body() {
    let state = AppState::in_memory();
    let req = Request::builder()
        .method("POST")
        .uri("/api/queue")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_registrations_get_distinct_dense_tickets() {
    let state = AppState::in_memory();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { register(&state, &format!("customer-{i}")).await })
        })
        .collect();
    let numbers: BTreeSet<u64> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap()["ticket_number"].as_u64().unwrap())
        .collect();

    assert_eq!(numbers, (1..=50).collect::<BTreeSet<u64>>());
}

// =========================================================================
// GET /api/queues, GET /api/queues/summary
// =========================================================================

#[tokio::test]
async fn list_is_empty_initially() {
    let state = AppState::in_memory();
    let (status, json) = send(&state, get("/api/queues")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn list_is_ordered_by_ticket_number() {
    let state = AppState::in_memory();
    for name in ["Alice", "Bob", "Carol"] {
        register(&state, name).await;
    }

    let (status, json) = send(&state, get("/api/queues")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    let numbers: Vec<u64> = entries
        .iter()
        .map(|e| e["ticket_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(entries[0]["status"], "waiting");
    assert!(entries[0]["created_at"].is_string());
}

#[tokio::test]
async fn summary_counts_each_status() {
    let state = AppState::in_memory();
    let a = register(&state, "Alice").await;
    let b = register(&state, "Bob").await;
    register(&state, "Carol").await;

    set_status(&state, a["id"].as_str().unwrap(), "done").await;
    set_status(&state, b["id"].as_str().unwrap(), "in-progress").await;

    let (status, json) = send(&state, get("/api/queues/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["waiting"], 1);
    assert_eq!(json["in_progress"], 1);
    assert_eq!(json["done"], 1);
}

// =========================================================================
// GET /api/queue/{number}
// =========================================================================

#[tokio::test]
async fn lookup_by_ticket_number() {
    let state = AppState::in_memory();
    register(&state, "Alice").await;
    register(&state, "Bob").await;

    let (status, json) = send(&state, get("/api/queue/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Bob");
    assert_eq!(json["ticket_number"], 2);
    assert_eq!(json["status"], "waiting");
}

#[tokio::test]
async fn lookup_unknown_ticket_is_not_found() {
    let state = AppState::in_memory();
    register(&state, "Alice").await;

    let (status, json) = send(&state, get("/api/queue/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn lookup_non_numeric_ticket_is_bad_request() {
    let state = AppState::in_memory();
    for uri in ["/api/queue/abc", "/api/queue/-1", "/api/queue/1.5"] {
        let (status, _) = send(&state, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
    }
}

// =========================================================================
// PUT /api/queue/{id}/status
// =========================================================================

#[tokio::test]
async fn status_change_is_visible_in_lookup() {
    let state = AppState::in_memory();
    let alice = register(&state, "Alice").await;

    let (status, json) = set_status(&state, alice["id"].as_str().unwrap(), "in-progress").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "success": true }));

    let (_, entry) = send(&state, get("/api/queue/1")).await;
    assert_eq!(entry["status"], "in-progress");
}

#[tokio::test]
async fn status_may_move_backwards_by_default() {
    let state = AppState::in_memory();
    let alice = register(&state, "Alice").await;
    let id = alice["id"].as_str().unwrap();

    assert_eq!(set_status(&state, id, "done").await.0, StatusCode::OK);
    assert_eq!(set_status(&state, id, "waiting").await.0, StatusCode::OK);

    let (_, entry) = send(&state, get("/api/queue/1")).await;
    assert_eq!(entry["status"], "waiting");
}

#[tokio::test]
async fn status_change_for_unknown_id_is_not_found() {
    let state = AppState::in_memory();
    let id = queueline_types::EntryId::new().to_string();
    let (status, _) = set_status(&state, &id, "done").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_change_rejects_bad_input() {
    let state = AppState::in_memory();
    let alice = register(&state, "Alice").await;
    let id = alice["id"].as_str().unwrap();

    let (status, _) = set_status(&state, id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = set_status(&state, "not-a-uuid", "done").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        json_request(
            "PUT",
            &format!("/api/queue/{id}/status"),
            &serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, entry) = send(&state, get("/api/queue/1")).await;
    assert_eq!(entry["status"], "waiting");
}

#[tokio::test]
async fn forward_policy_rejects_regressions() {
    let state = policy_state(QueuePolicy {
        enforce_forward_transitions: true,
        require_done_before_remove: false,
    });
    let alice = register(&state, "Alice").await;
    let id = alice["id"].as_str().unwrap();

    assert_eq!(set_status(&state, id, "in-progress").await.0, StatusCode::OK);
    assert_eq!(set_status(&state, id, "in-progress").await.0, StatusCode::OK);
    assert_eq!(set_status(&state, id, "waiting").await.0, StatusCode::CONFLICT);
    assert_eq!(set_status(&state, id, "done").await.0, StatusCode::OK);
    assert_eq!(set_status(&state, id, "in-progress").await.0, StatusCode::CONFLICT);

    let (_, entry) = send(&state, get("/api/queue/1")).await;
    assert_eq!(entry["status"], "done");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn forward_policy_holds_under_concurrent_updates() {
    let state = policy_state(QueuePolicy {
        enforce_forward_transitions: true,
        require_done_before_remove: false,
    });

    for _ in 0..100 {
        let entry = register(&state, "Alice").await;
        let id = entry["id"].as_str().unwrap().to_owned();
        let number = entry["ticket_number"].as_u64().unwrap();

        let finish = {
            let (state, id) = (Arc::clone(&state), id.clone());
            tokio::spawn(async move { set_status(&state, &id, "done").await.0 })
        };
        let start = {
            let (state, id) = (Arc::clone(&state), id.clone());
            tokio::spawn(async move { set_status(&state, &id, "in-progress").await.0 })
        };

        assert_eq!(finish.await.unwrap(), StatusCode::OK);
        let started = start.await.unwrap();
        assert!(started == StatusCode::OK || started == StatusCode::CONFLICT);

        let (_, current) = send(&state, get(&format!("/api/queue/{number}"))).await;
        assert_eq!(current["status"], "done");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn done_policy_holds_under_concurrent_reopen() {
    let state = policy_state(QueuePolicy {
        enforce_forward_transitions: false,
        require_done_before_remove: true,
    });

    for _ in 0..100 {
        let entry = register(&state, "Alice").await;
        let id = entry["id"].as_str().unwrap().to_owned();
        let number = entry["ticket_number"].as_u64().unwrap();
        set_status(&state, &id, "done").await;

        let removal = {
            let (state, id) = (Arc::clone(&state), id.clone());
            tokio::spawn(async move { send(&state, delete(&format!("/api/queue/{id}"))).await.0 })
        };
        let reopen = {
            let (state, id) = (Arc::clone(&state), id.clone());
            tokio::spawn(async move { set_status(&state, &id, "waiting").await.0 })
        };
        let removed = removal.await.unwrap();
        let reopened = reopen.await.unwrap();

        let (found, current) = send(&state, get(&format!("/api/queue/{number}"))).await;
        if removed == StatusCode::OK {
            // Removed while still done, so the reopen ran afterwards.
            assert_eq!(reopened, StatusCode::NOT_FOUND);
            assert_eq!(found, StatusCode::NOT_FOUND);
        } else {
            assert_eq!(removed, StatusCode::CONFLICT);
            assert_eq!(reopened, StatusCode::OK);
            assert_eq!(current["status"], "waiting");
        }
    }
}

// =========================================================================
// DELETE /api/queue/{id}
// =========================================================================

#[tokio::test]
async fn removed_entry_disappears_and_number_is_not_reused() {
    let state = AppState::in_memory();
    let alice = register(&state, "Alice").await;
    register(&state, "Bob").await;

    let (status, json) = send(
        &state,
        delete(&format!("/api/queue/{}", alice["id"].as_str().unwrap())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "success": true }));

    let (status, _) = send(&state, get("/api/queue/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let carol = register(&state, "Carol").await;
    assert_eq!(carol["ticket_number"], 3);

    let (_, list) = send(&state, get("/api/queues")).await;
    let numbers: Vec<u64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ticket_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![2, 3]);
}

#[tokio::test]
async fn removing_twice_is_not_found() {
    let state = AppState::in_memory();
    let alice = register(&state, "Alice").await;
    let uri = format!("/api/queue/{}", alice["id"].as_str().unwrap());

    assert_eq!(send(&state, delete(&uri)).await.0, StatusCode::OK);
    assert_eq!(send(&state, delete(&uri)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_rejects_malformed_id() {
    let state = AppState::in_memory();
    let (status, _) = send(&state, delete("/api/queue/xyz")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn done_policy_rejects_removing_active_entries() {
    let state = policy_state(QueuePolicy {
        enforce_forward_transitions: false,
        require_done_before_remove: true,
    });
    let alice = register(&state, "Alice").await;
    let id = alice["id"].as_str().unwrap();
    let uri = format!("/api/queue/{id}");

    assert_eq!(send(&state, delete(&uri)).await.0, StatusCode::CONFLICT);
    set_status(&state, id, "done").await;
    assert_eq!(send(&state, delete(&uri)).await.0, StatusCode::OK);
}

// =========================================================================
// Notifications
// =========================================================================

#[tokio::test]
async fn committed_changes_are_published() {
    let state = AppState::in_memory();
    let mut rx = state.notifier.subscribe();

    let alice = register(&state, "Alice").await;
    assert_eq!(rx.recv().await.unwrap(), QueueEvent::EntryListChanged);

    // The change is already visible when the event arrives.
    let (_, list) = send(&state, get("/api/queues")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let id_str = alice["id"].as_str().unwrap();
    set_status(&state, id_str, "in-progress").await;
    let id = id_str.parse().unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        QueueEvent::StatusChanged {
            id,
            status: EntryStatus::InProgress,
        }
    );

    send(&state, delete(&format!("/api/queue/{id_str}"))).await;
    assert_eq!(rx.recv().await.unwrap(), QueueEvent::EntryListChanged);
}

#[tokio::test]
async fn rejected_requests_publish_nothing() {
    let state = AppState::in_memory();
    let mut rx = state.notifier.subscribe();

    send(
        &state,
        json_request("POST", "/api/queue", &serde_json::json!({ "name": " " })),
    )
    .await;
    let unknown = queueline_types::EntryId::new().to_string();
    set_status(&state, &unknown, "done").await;
    send(&state, delete(&format!("/api/queue/{unknown}"))).await;

    assert!(rx.try_recv().is_err());
}

// =========================================================================
// GET /api/health
// =========================================================================

#[tokio::test]
async fn health_reports_ok() {
    let state = AppState::in_memory();
    let (status, json) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "memory");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let state = AppState::in_memory();
    let (status, _) = send(&state, get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
