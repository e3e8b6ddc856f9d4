//! Paste HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use ephemera_core::models::{NewPaste, Paste};
use ephemera_core::ttl::resolve_ttl;
use serde::{Deserialize, Serialize};

/// JSON body for `POST /api/paste`.
#[derive(Debug, Deserialize)]
pub struct CreatePasteRequest {
    pub content: String,
    pub language: Option<String>,
    pub title: Option<String>,
    /// Duration string such as `30m` or `1h30m`.
    pub ttl: Option<String>,
    pub max_views: Option<i64>,
}

/// Body returned by a successful create. Content is left out.
#[derive(Debug, Serialize)]
pub struct CreatePasteResponse {
    pub id: String,
    pub language: String,
    pub title: Option<String>,
    pub max_views: i64,
    pub expires_at: DateTime<Utc>,
    pub raw: String,
    pub view: String,
}

impl From<&Paste> for CreatePasteResponse {
    fn from(paste: &Paste) -> Self {
        Self {
            id: paste.id.clone(),
            language: paste.language.clone(),
            title: paste.title.clone(),
            max_views: paste.max_views,
            expires_at: paste.expires_at,
            raw: format!("/api/paste/{}/raw", paste.id),
            view: format!("/api/view/{}", paste.id),
        }
    }
}

pub async fn create_paste(
    State(state): State<AppState>,
    Json(request): Json<CreatePasteRequest>,
) -> Result<Json<CreatePasteResponse>, HttpError> {
    let ttl = resolve_ttl(
        request.ttl.as_deref(),
        state.config.default_ttl,
        state.config.max_ttl,
    )?;
    let ctx = state.request_context();
    let paste = state
        .pastes
        .create(
            &ctx,
            NewPaste {
                content: request.content,
                language: request.language,
                title: request.title,
                ttl,
                max_views: request.max_views,
            },
        )
        .await?;
    Ok(Json(CreatePasteResponse::from(&paste)))
}

/// `GET /api/paste/:id` counts one view.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paste>, HttpError> {
    let ctx = state.request_context();
    Ok(Json(state.pastes.get(&ctx, &id).await?))
}

/// `GET /api/paste/:id/raw` returns the content as plain text and counts one
/// view, independently of `get_paste`.
pub async fn get_raw_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let ctx = state.request_context();
    let content = state.pastes.get_raw(&ctx, &id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

pub async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let ctx = state.request_context();
    state.pastes.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
