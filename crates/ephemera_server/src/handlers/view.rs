//! Universal viewer and liveness probe.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use ephemera_core::models::{FileInfo, Paste};
use ephemera_core::{AppError, ErrorKind};
use serde::Serialize;

/// Content behind an id, tagged with `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewResponse {
    Paste(Paste),
    File(FileInfo),
}

/// `GET /api/view/:id`.
///
/// Pastes are tried first and a hit counts one view. Only an unknown paste id
/// falls through to file metadata; an expired or exhausted paste is reported
/// as such. File lookups here never count a download.
pub async fn view_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewResponse>, HttpError> {
    let ctx = state.request_context();
    match state.pastes.get(&ctx, &id).await {
        Ok(paste) => {
            tracing::debug!(content_id = %id, "Serving as paste");
            return Ok(Json(ViewResponse::Paste(paste)));
        }
        Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
        Err(_) => {}
    }

    match state.files.get_info(&ctx, &id).await {
        Ok(entry) => {
            tracing::debug!(content_id = %id, "Serving as file");
            Ok(Json(ViewResponse::File(FileInfo::from(&entry))))
        }
        Err(AppError::NotFound) => {
            tracing::warn!(content_id = %id, "Content not found");
            Err(AppError::NotFound.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn health() -> &'static str {
    "OK"
}
