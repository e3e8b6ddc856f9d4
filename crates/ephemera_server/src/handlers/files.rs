//! File HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use ephemera_core::models::{download_file_name, FileInfo, NewFile};
use ephemera_core::ttl::resolve_ttl;
use serde::Serialize;
use tokio_util::io::ReaderStream;

/// Body returned by a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: FileInfo,
    pub download: String,
    pub view: String,
}

struct UploadedPart {
    file_name: String,
    content_type: String,
    data: axum::body::Bytes,
}

fn parse_max_downloads(raw: &str) -> Result<Option<i64>, HttpError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| HttpError::bad_request(format!("invalid max_downloads '{}'", raw)))
}

/// `attachment; filename="..."` with characters a header cannot carry replaced.
fn attachment_header(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// `POST /api/file` with multipart fields `file`, `ttl` and `max_downloads`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpError> {
    let mut upload = None;
    let mut ttl = None;
    let mut max_downloads = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                upload = Some(UploadedPart {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("ttl") => ttl = Some(field.text().await?),
            Some("max_downloads") => max_downloads = parse_max_downloads(&field.text().await?)?,
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(HttpError::bad_request("missing file field"));
    };
    // The request body limit carries multipart slack; the file itself gets the exact cap.
    if upload.data.len() > state.config.max_upload_size {
        return Err(HttpError::payload_too_large(state.config.max_upload_size));
    }
    let ttl = resolve_ttl(
        ttl.as_deref(),
        state.config.default_ttl,
        state.config.max_ttl,
    )?;

    let ctx = state.request_context();
    let mut body: &[u8] = upload.data.as_ref();
    let entry = state
        .files
        .upload(
            &ctx,
            &mut body,
            NewFile {
                original_name: upload.file_name,
                size: upload.data.len() as u64,
                content_type: upload.content_type,
                ttl,
                max_downloads,
            },
        )
        .await?;

    Ok(Json(UploadResponse {
        download: format!("/api/file/{}", entry.id),
        view: format!("/api/view/{}", entry.id),
        file: FileInfo::from(&entry),
    }))
}

/// `GET /api/file/:id` streams the blob and counts one download.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let ctx = state.request_context();
    let (reader, entry) = state.files.download(&ctx, &id).await?;

    let mut response = Body::from_stream(ReaderStream::new(reader)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&entry.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(entry.size));
    headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_header(&download_file_name(&entry.original_name, Utc::now())),
    );
    Ok(response)
}

/// `GET /api/file/:id/info`; no gating and no counter change.
pub async fn file_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileInfo>, HttpError> {
    let ctx = state.request_context();
    let entry = state.files.get_info(&ctx, &id).await?;
    Ok(Json(FileInfo::from(&entry)))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let ctx = state.request_context();
    state.files.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
