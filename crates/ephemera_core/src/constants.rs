//! Shared constants used across Ephemera crates.

use std::time::Duration;

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:8080";

/// Default maximum multipart upload size accepted by the API layer.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Default maximum paste size accepted by the API layer.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Time-to-live applied when the caller supplies none.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound for caller-supplied time-to-live values.
pub const DEFAULT_MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Per-request deadline forwarded to storage capabilities.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Length of public content identifiers.
pub const ID_LENGTH: usize = 11;

/// Usage-limit sentinel meaning "no cap".
pub const UNLIMITED: i64 = -1;

/// Language tag stored when detection finds nothing recognizable.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";
