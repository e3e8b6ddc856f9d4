//! Core domain library for Ephemera (config, storage, content lifecycle).

/// Blob storage backed by the local filesystem.
pub mod blob;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across crates.
pub mod constants;
/// Cancellation and deadline propagation for storage calls.
pub mod context;
/// Metadata storage backed by redb.
pub mod db;
/// Language detection for untagged pastes.
pub mod detection;
/// Process-global environment mutation helpers.
pub mod env;
/// Error taxonomy for storage capabilities and lifecycle operations.
pub mod error;
/// Expiry and usage-limit gating shared by files and pastes.
pub mod gate;
/// Short URL-safe identifier generation.
pub mod ids;
/// File and paste lifecycle managers.
pub mod lifecycle;
/// Data models for persistence and API responses.
pub mod models;
/// Storage capability traits.
pub mod store;
/// Periodic expiry sweep task.
pub mod sweep;
/// Shared text normalization helpers.
pub mod text;
/// Time-to-live parsing.
pub mod ttl;

#[cfg(test)]
pub(crate) mod test_support;

pub use blob::FsBlobStore;
pub use config::Config;
pub use constants::{DEFAULT_CLI_SERVER_URL, DEFAULT_PORT, UNKNOWN_LANGUAGE, UNLIMITED};
pub use context::OpContext;
pub use db::Database;
pub use error::{AppError, ErrorKind, StorageError};
pub use lifecycle::{FileManager, PasteManager};
pub use models::{FileEntry, FileInfo, Paste};
pub use sweep::ExpirySweeper;
