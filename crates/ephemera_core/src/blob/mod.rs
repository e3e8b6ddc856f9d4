//! Blob storage backed by the local filesystem.

use crate::context::OpContext;
use crate::error::StorageError;
use crate::ids::is_url_safe;
use crate::store::{BlobReader, BlobStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const PART_SUFFIX: &str = ".part";
const DEFAULT_URL_PREFIX: &str = "/blobs";

/// Stores each blob as one file named after its key under `root`.
///
/// Writes land in a `.part` file that is renamed into place once the expected
/// number of bytes has been flushed, so readers never observe a partial blob.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }

    /// Override the prefix used by [`BlobStore::url_for`].
    #[must_use]
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_url_safe(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

async fn write_blob(
    root: &Path,
    part_path: &Path,
    final_path: &Path,
    body: &mut (dyn AsyncRead + Send + Unpin),
    size: u64,
) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(root).await?;
    let mut file = tokio::fs::File::create(part_path).await?;

    // One extra byte is enough to detect an oversized body.
    let mut limited = body.take(size.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file).await?;
    if written != size {
        return Err(StorageError::SizeMismatch {
            expected: size,
            actual: written,
        });
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(part_path, final_path).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        ctx: &OpContext,
        key: &str,
        body: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let final_path = self.blob_path(key)?;
        let part_path = self.root.join(format!("{}{}", key, PART_SUFFIX));

        let result = ctx
            .run(write_blob(&self.root, &part_path, &final_path, body, size))
            .await;
        match &result {
            Ok(()) => {
                tracing::debug!(key, size, content_type, "Stored blob");
            }
            Err(err) => {
                if let Err(cleanup) = remove_if_present(&part_path).await {
                    tracing::warn!(
                        "Failed to remove partial blob {}: {}",
                        part_path.display(),
                        cleanup
                    );
                }
                tracing::debug!(key, error = %err, "Blob write aborted");
            }
        }
        result
    }

    async fn get(&self, ctx: &OpContext, key: &str) -> Result<BlobReader, StorageError> {
        let path = self.blob_path(key)?;
        let file = ctx
            .run(async move {
                match tokio::fs::File::open(&path).await {
                    Ok(file) => Ok(file),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        Err(StorageError::NotFound)
                    }
                    Err(err) => Err(err.into()),
                }
            })
            .await?;
        Ok(Box::new(file))
    }

    async fn delete(&self, ctx: &OpContext, key: &str) -> Result<(), StorageError> {
        let path = self.blob_path(key)?;
        ctx.run(async move { remove_if_present(&path).await }).await
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), key)
    }
}
