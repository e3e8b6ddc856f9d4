//! Binary file lifecycle: upload, gated download, info, delete and sweep.

use super::{ExpiringResource, Operations};
use crate::context::OpContext;
use crate::error::AppError;
use crate::ids::{RandomTokens, TokenGenerator};
use crate::models::{FileEntry, NewFile};
use crate::store::{BlobReader, BlobStore, RecordStore};
use crate::text::{normalize_optional_nonempty, sanitize_file_name};
use crate::ttl::expiry_after;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;

static FILE_OPS: Operations = Operations {
    noun: "file",
    insert: "store file metadata",
    find: "find file",
    increment: "increment downloads",
    remove: "remove file metadata",
    sweep: "remove expired files",
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upper bound for the compensating blob delete after a failed metadata write.
const COMPENSATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrates binary file content across the metadata and blob stores.
pub struct FileManager {
    records: ExpiringResource<FileEntry>,
    blobs: Arc<dyn BlobStore>,
    tokens: Arc<dyn TokenGenerator>,
}

impl FileManager {
    pub fn new(records: Arc<dyn RecordStore<FileEntry>>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            records: ExpiringResource::new(records, &FILE_OPS),
            blobs,
            tokens: Arc::new(RandomTokens),
        }
    }

    /// Replace the id and storage-key generator.
    #[must_use]
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Store `body` as a new file.
    ///
    /// The blob is written first and the metadata row second. When the row
    /// cannot be written the blob is deleted again, so a committed row always
    /// points at a stored blob.
    ///
    /// # Errors
    /// - [`AppError::InvalidInput`] for a non-positive TTL or a missing name.
    /// - [`AppError::Storage`] when the blob write or metadata write fails.
    /// - [`AppError::RollbackFailed`] when the metadata write and the
    ///   compensating blob delete both fail.
    pub async fn upload(
        &self,
        ctx: &OpContext,
        body: &mut (dyn AsyncRead + Send + Unpin),
        new: NewFile,
    ) -> Result<FileEntry, AppError> {
        let now = Utc::now();
        expiry_after(now, new.ttl)?;
        let original_name = sanitize_file_name(&new.original_name)
            .ok_or_else(|| AppError::InvalidInput("file name is required".to_string()))?;
        let content_type = normalize_optional_nonempty(Some(new.content_type))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let entry = FileEntry::new(
            self.tokens.as_ref(),
            NewFile {
                original_name,
                content_type,
                ..new
            },
            now,
        );
        tracing::debug!(
            file_id = %entry.id,
            storage_key = %entry.storage_key,
            size = entry.size,
            "Uploading file"
        );

        self.blobs
            .put(ctx, &entry.storage_key, body, entry.size, &entry.content_type)
            .await
            .map_err(|err| AppError::storage("upload blob", &entry.id, err))?;

        if let Err(source) = self.records.insert(ctx, &entry).await {
            tracing::error!(
                file_id = %entry.id,
                storage_key = %entry.storage_key,
                error = %source,
                "Failed to store file metadata, removing blob"
            );
            // The request context may be what failed the insert; cleanup gets its own bound.
            let rollback_ctx = OpContext::with_timeout(COMPENSATION_TIMEOUT);
            return match self.blobs.delete(&rollback_ctx, &entry.storage_key).await {
                Ok(()) => Err(AppError::storage(FILE_OPS.insert, &entry.id, source)),
                Err(rollback) => {
                    tracing::error!(
                        file_id = %entry.id,
                        storage_key = %entry.storage_key,
                        error = %rollback,
                        "Failed to remove blob after metadata failure"
                    );
                    Err(AppError::RollbackFailed {
                        operation: FILE_OPS.insert,
                        id: entry.id.clone(),
                        source,
                        rollback,
                    })
                }
            };
        }

        tracing::info!(file_id = %entry.id, size = entry.size, "File uploaded");
        Ok(entry)
    }

    /// Open a file for download and count the download.
    ///
    /// The returned entry carries the incremented counter. The reader must be
    /// drained or dropped by the caller.
    ///
    /// # Errors
    /// [`AppError::NotFound`], [`AppError::Expired`], [`AppError::LimitExceeded`]
    /// or a storage failure. No reader is leaked on any error path.
    pub async fn download(
        &self,
        ctx: &OpContext,
        id: &str,
    ) -> Result<(BlobReader, FileEntry), AppError> {
        let mut entry = self.records.find_accessible(ctx, id).await?;
        let reader = self
            .blobs
            .get(ctx, &entry.storage_key)
            .await
            .map_err(|err| AppError::storage("open blob", id, err))?;

        match self.records.record_access(ctx, id).await {
            Ok(downloads) => {
                entry.downloads = downloads;
                tracing::info!(file_id = %id, downloads, "File downloaded");
                Ok((reader, entry))
            }
            Err(err) => {
                drop(reader);
                tracing::error!(file_id = %id, error = %err, "Failed to count download");
                Err(err)
            }
        }
    }

    /// Metadata lookup without gating or side effects.
    ///
    /// # Errors
    /// [`AppError::NotFound`] or a storage failure.
    pub async fn get_info(&self, ctx: &OpContext, id: &str) -> Result<FileEntry, AppError> {
        self.records.find(ctx, id).await
    }

    /// Delete the blob, then the metadata row.
    ///
    /// # Errors
    /// [`AppError::NotFound`] for unknown ids, or the blob/metadata failure.
    pub async fn delete(&self, ctx: &OpContext, id: &str) -> Result<(), AppError> {
        let entry = self.records.find(ctx, id).await?;
        self.blobs
            .delete(ctx, &entry.storage_key)
            .await
            .map_err(|err| AppError::storage("delete blob", id, err))?;
        self.records.remove(ctx, id).await?;
        tracing::info!(file_id = %id, "File deleted");
        Ok(())
    }

    /// Remove expired rows, then their blobs.
    ///
    /// Blob deletes are best effort: a failure is logged and leaves an orphaned
    /// blob, never an orphaned row.
    ///
    /// # Returns
    /// Number of metadata rows removed.
    ///
    /// # Errors
    /// A storage failure from the bulk metadata delete.
    pub async fn cleanup_expired(&self, ctx: &OpContext) -> Result<usize, AppError> {
        let expired = self.records.remove_expired(ctx).await?;
        let mut orphaned = 0usize;
        for entry in &expired {
            if let Err(err) = self.blobs.delete(ctx, &entry.storage_key).await {
                orphaned += 1;
                tracing::warn!(
                    file_id = %entry.id,
                    storage_key = %entry.storage_key,
                    error = %err,
                    "Failed to delete blob of expired file"
                );
            }
        }
        if !expired.is_empty() {
            tracing::info!(removed = expired.len(), orphaned, "Removed expired files");
        }
        Ok(expired.len())
    }
}
