//! Facade smoke test: the re-exported router serves a full paste round trip.

use axum::http::StatusCode;
use axum_test::TestServer;
use ephemera::{create_app, AppState, Config};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;

fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = Config {
        db_path: temp_dir.path().join("db").to_string_lossy().to_string(),
        blob_dir: temp_dir.path().join("blobs").to_string_lossy().to_string(),
        port: 0,
        max_upload_size: 1024 * 1024,
        max_paste_size: 1024 * 1024,
        default_ttl: Duration::from_secs(3600),
        max_ttl: Duration::from_secs(7200),
        sweep_interval: Duration::from_secs(3600),
        storage_timeout: Duration::from_secs(10),
    };
    let state = AppState::open(config).expect("open state");
    let server = TestServer::new(create_app(state, false)).expect("server");
    (server, temp_dir)
}

#[tokio::test]
async fn paste_round_trip_through_facade() {
    let (server, _temp) = setup_test_server();

    let create = server
        .post("/api/paste")
        .json(&json!({ "content": "{\"hello\": \"world\"}" }))
        .await;
    assert_eq!(create.status_code(), StatusCode::OK);
    let created: Value = create.json();
    assert_eq!(created["language"], "json");
    let id = created["id"].as_str().expect("paste id");

    let raw = server.get(&format!("/api/paste/{}/raw", id)).await;
    assert_eq!(raw.status_code(), StatusCode::OK);
    assert_eq!(raw.text(), "{\"hello\": \"world\"}");

    let health = server.get("/health").await;
    assert_eq!(health.text(), "OK");
}
