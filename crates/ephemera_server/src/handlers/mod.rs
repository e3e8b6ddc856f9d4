//! HTTP request handlers.

/// File upload, download, info and delete endpoints.
pub mod files;
/// Paste endpoints.
pub mod pastes;
/// Universal viewer and health endpoints.
pub mod view;
