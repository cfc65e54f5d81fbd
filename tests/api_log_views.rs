use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use fleet_broker::{
    api::{create_router, AppState},
    coordination::CoordinationStore,
};
use serde_json::Value;
use std::{fs, path::Path, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;

const MRA_LOG: &str = "\
[2024-01-01 10:00:00] MRA started
[2024-01-01 10:00:01] Querying DA: DA1
[2024-01-01 10:00:01] >>> SENT MESSAGE
  Performative: REQUEST
  Content: QUERY_VEHICLE_INFO
[2024-01-01 10:00:02] Querying DA: DA2
[2024-01-01 10:00:03] Solving CVRP problem for request abc
[2024-01-01 10:00:04] Unserved customers: 0
[2024-01-01 10:00:04] VRP solution found: 2 routes
[2024-01-01 10:00:05] Assigning route R1 to vehicle DA1
[2024-01-01 10:00:05] Sending route assignment message: R1
[2024-01-01 10:00:06] <<< RECEIVED MESSAGE ROUTE_ACCEPTED:R1
[2024-01-01 10:00:06] ERROR: DA2 did not answer
";

const DA1_LOG: &str = "\
[2024-01-01 10:00:05] Route R1 added to queue. Queue size: 1
[2024-01-01 10:00:06] Processing route R1 from queue. Remaining: 0
[2024-01-01 10:00:07] EVENT: Starting route: 1 customers. Moving to (1.0, 2.0)
[2024-01-01 10:00:09] EVENT: ARRIVED at customer C1 (ID: 1) at (1.0, 2.0)
[2024-01-01 10:00:09] EVENT: ARRIVED at customer C2 (ID: 2) at (oops, 2.0)
[2024-01-01 10:00:12] EVENT: RETURNED to depot. Route R1 completed. at (0.0, 0.0)
[2024-01-01 10:00:12] Route queue is empty. Waiting for new routes.
";

const DA2_LOG: &str = "\
[2024-01-01 10:00:05] Route R2 added to queue. Queue size: 1
[2024-01-01 10:00:05] Route R3 added to queue. Queue size: 2
";

fn write_logs(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("MRA_conversations.log"), MRA_LOG).unwrap();
    fs::write(dir.join("DA-DA1_conversations.log"), DA1_LOG).unwrap();
    fs::write(dir.join("DA-DA2_conversations.log"), DA2_LOG).unwrap();
}

fn test_app(logs: &Path) -> Router {
    create_router(AppState::new(Arc::new(CoordinationStore::new()), logs))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build empty request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

#[tokio::test]
async fn views_are_empty_without_logs() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp.path().join("not-created-yet"));

    let (status, movements) = get_json(&app, "/api/da-movements").await;
    assert_eq!(status, StatusCode::OK);
    assert!(movements["movements"].as_object().unwrap().is_empty());
    assert!(movements["queue_status"].as_object().unwrap().is_empty());

    let (status, comms) = get_json(&app, "/api/agent-communication").await;
    assert_eq!(status, StatusCode::OK);
    assert!(comms["communications"].as_array().unwrap().is_empty());

    let (status, state) = get_json(&app, "/api/system-state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["state"]["mra"]["status"], "unknown");
    assert!(state["state"]["das"].as_object().unwrap().is_empty());

    let (status, logs) = get_json(&app, "/log").await;
    assert_eq!(status, StatusCode::OK);
    assert!(logs["agents"].as_array().unwrap().is_empty());

    let (status, latest) = get_json(&app, "/api/latest-logs").await;
    assert_eq!(status, StatusCode::OK);
    assert!(latest["folder"].is_null());
}

#[tokio::test]
async fn movement_view_from_dispatcher_logs() {
    let tmp = TempDir::new().unwrap();
    write_logs(tmp.path());
    let app = test_app(tmp.path());

    let (status, view) = get_json(&app, "/api/da-movements").await;
    assert_eq!(status, StatusCode::OK);

    let da1 = view["movements"]["DA1"].as_array().unwrap();
    let kinds: Vec<&str> = da1.iter().map(|m| m["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["route_start", "arrival", "depot"]);
    assert_eq!(da1[1]["customer"], "C1");
    assert_eq!(da1[1]["x"], 1.0);

    // DA2 never moved
    assert!(view["movements"].get("DA2").is_none());

    assert_eq!(view["queue_status"]["DA1"]["queue_size"], 0);
    assert_eq!(view["queue_status"]["DA1"]["current_route"], "R1");
    assert_eq!(view["queue_status"]["DA2"]["queue_size"], 2);

    let phases: Vec<&str> = view["routes"]["DA1"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(phases, vec!["queued", "executing", "completed"]);
}

#[tokio::test]
async fn communication_and_system_state_views() {
    let tmp = TempDir::new().unwrap();
    write_logs(tmp.path());
    let app = test_app(tmp.path());

    let (status, view) = get_json(&app, "/api/agent-communication").await;
    assert_eq!(status, StatusCode::OK);
    let comms = view["communications"].as_array().unwrap();
    let kinds: Vec<(&str, &str)> = comms
        .iter()
        .map(|c| (c["type"].as_str().unwrap(), c["direction"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("query", "sent"),
            ("route_assignment", "sent"),
            ("route_response", "received"),
        ]
    );
    assert_eq!(comms[0]["message"], ">>> SENT MESSAGE");

    let (status, view) = get_json(&app, "/api/system-state").await;
    assert_eq!(status, StatusCode::OK);
    let mra = &view["state"]["mra"];
    assert_eq!(mra["status"], "solved");
    assert_eq!(mra["vehicles_queried"], 2);
    assert_eq!(mra["routes_assigned"], 1);
    assert_eq!(mra["unserved_customers"], 0);

    let da1 = &view["state"]["das"]["DA1"];
    assert_eq!(da1["status"], "idle");
    assert_eq!(da1["routes_completed"], 1);
    let da2 = &view["state"]["das"]["DA2"];
    assert_eq!(da2["status"], "queued");
    assert_eq!(da2["queue_size"], 2);
}

#[tokio::test]
async fn raw_logs_and_entries() {
    let tmp = TempDir::new().unwrap();
    write_logs(tmp.path());
    let app = test_app(tmp.path());

    let (status, listing) = get_json(&app, "/log").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listing["agents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["mra", "DA1", "DA2"]);
    assert_eq!(listing["agents"][1]["endpoint"], "/log/DA1");

    let (status, log) = get_json(&app, "/log/mra").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["log_file"], "MRA_conversations.log");
    assert_eq!(log["content"], MRA_LOG);
    assert_eq!(log["size"], MRA_LOG.len());

    let (status, log) = get_json(&app, "/log/DA-DA2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["content"], DA2_LOG);

    let (status, missing) = get_json(&app, "/log/DA9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["searched_file"], "DA-DA9_conversations.log");
    assert_eq!(missing["available_files"].as_array().unwrap().len(), 3);

    let (status, entries) = get_json(&app, "/log/mra/entries").await;
    assert_eq!(status, StatusCode::OK);
    let entries = entries["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 11);
    assert_eq!(entries[2]["level"], "message");
    assert!(entries[2]["message"]
        .as_str()
        .unwrap()
        .contains("QUERY_VEHICLE_INFO"));
    assert_eq!(entries[10]["level"], "error");
}

#[tokio::test]
async fn run_folders() {
    let tmp = TempDir::new().unwrap();
    write_logs(&tmp.path().join("2024-01-01_10-00-00"));
    fs::create_dir_all(tmp.path().join("2024-01-02_08-00-00")).unwrap();
    fs::write(
        tmp.path()
            .join("2024-01-02_08-00-00")
            .join("DA-DA7_conversations.log"),
        "[t] Route R9 added to queue. Queue size: 4\n",
    )
    .unwrap();
    let app = test_app(tmp.path());

    let (status, folders) = get_json(&app, "/api/log-folders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(folders["folders"][0], "2024-01-02_08-00-00");
    assert_eq!(folders["folders"][1], "2024-01-01_10-00-00");

    let (_, latest) = get_json(&app, "/api/latest-logs").await;
    assert_eq!(latest["folder"], "2024-01-02_08-00-00");
    assert_eq!(latest["agents"], serde_json::json!(["DA7"]));

    let (status, view) = get_json(&app, "/api/system-state/2024-01-01_10-00-00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"]["mra"]["status"], "solved");

    let (status, view) = get_json(&app, "/api/da-movements/2024-01-02_08-00-00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["queue_status"]["DA7"]["queue_size"], 4);

    let (status, _) = get_json(&app, "/api/system-state/bad..name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn system_state_follows_agent_marker_forms() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("MRA_conversations.log"),
        "\
[2024-01-01 11:00:00] EVENT: Processing request from queue: REQ-1
[2024-01-01 11:00:01] EVENT: Solving CVRP problem for request: REQ-1
[2024-01-01 11:00:02] EVENT: No solution found - all 3 customers unserved
[2024-01-01 11:00:02] EVENT: Starting route assignment to 0 routes
",
    )
    .unwrap();
    fs::write(
        tmp.path().join("DA-DA1_conversations.log"),
        "\
[2024-01-01 11:00:03] EVENT: ACCEPTED route R1: capacity=10 (demand=4, distance=12.5)
[2024-01-01 11:00:03] EVENT: Route R1 added to queue. Queue size: 1
[2024-01-01 11:00:03] EVENT: Route R1 ACCEPTED and queued
[2024-01-01 11:00:04] EVENT: Processing route from queue: R1
",
    )
    .unwrap();
    let app = test_app(tmp.path());

    let (status, view) = get_json(&app, "/api/system-state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"]["mra"]["status"], "solving");
    assert_eq!(view["state"]["mra"]["routes_assigned"], 0);

    let da1 = &view["state"]["das"]["DA1"];
    assert_eq!(da1["status"], "executing");
    assert_eq!(da1["queue_size"], 1);
    assert_eq!(da1["current_route"], "R1");

    let (_, movements) = get_json(&app, "/api/da-movements").await;
    assert!(movements["movements"].get("DA1").is_none());

    let (_, comms) = get_json(&app, "/api/agent-communication").await;
    assert!(comms["communications"].as_array().unwrap().is_empty());
}
