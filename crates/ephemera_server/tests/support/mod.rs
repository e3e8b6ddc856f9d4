//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use ephemera_server::{create_app, AppState, Config};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) const TEST_MAX_PASTE_SIZE: usize = 4096;

pub(crate) fn test_config_for_dir(dir: &Path) -> Config {
    Config {
        db_path: dir.join("db").to_str().expect("db path").to_string(),
        blob_dir: dir.join("blobs").to_str().expect("blob path").to_string(),
        port: 0,
        max_upload_size: 1024 * 1024,
        max_paste_size: TEST_MAX_PASTE_SIZE,
        default_ttl: Duration::from_secs(3600),
        max_ttl: Duration::from_secs(48 * 3600),
        sweep_interval: Duration::from_secs(3600),
        storage_timeout: Duration::from_secs(10),
    }
}

pub(crate) fn test_server_for_config(config: Config) -> (TestServer, AppState) {
    let state = AppState::open(config).expect("open state");
    let app = create_app(state.clone(), false);
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_dir(temp_dir.path());
    let (server, state) = test_server_for_config(config);
    (server, state, temp_dir)
}
