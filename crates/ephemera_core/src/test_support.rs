//! Test fixtures and fault-injecting store wrappers.

use crate::blob::FsBlobStore;
use crate::context::OpContext;
use crate::db::Database;
use crate::error::StorageError;
use crate::store::{BlobReader, BlobStore, RecordStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

/// redb database and blob directory inside one temporary directory.
pub(crate) struct TestStores {
    pub db: Database,
    pub blobs: FsBlobStore,
    _temp: TempDir,
}

pub(crate) fn test_stores() -> TestStores {
    let temp = TempDir::new().expect("temp dir");
    let db = Database::new(temp.path().join("db").to_str().expect("utf8 path")).expect("db");
    let blobs = FsBlobStore::new(temp.path().join("blobs"));
    TestStores {
        db,
        blobs,
        _temp: temp,
    }
}

fn injected() -> StorageError {
    StorageError::Io(io::Error::new(io::ErrorKind::Other, "injected failure"))
}

/// Record store that fails selected calls and forwards the rest.
pub(crate) struct FlakyRecords {
    inner: Database,
    pub fail_insert: AtomicBool,
    pub fail_increment: AtomicBool,
    pub fail_sweep: AtomicBool,
    pub sweeps: AtomicUsize,
}

impl FlakyRecords {
    pub(crate) fn new(inner: Database) -> Self {
        Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_increment: AtomicBool::new(false),
            fail_sweep: AtomicBool::new(false),
            sweeps: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<R> RecordStore<R> for FlakyRecords
where
    R: Send + Sync + 'static,
    Database: RecordStore<R>,
{
    async fn insert(&self, ctx: &OpContext, record: &R) -> Result<(), StorageError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(injected());
        }
        RecordStore::<R>::insert(&self.inner, ctx, record).await
    }

    async fn find(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError> {
        RecordStore::<R>::find(&self.inner, ctx, id).await
    }

    async fn increment_usage(&self, ctx: &OpContext, id: &str) -> Result<u64, StorageError> {
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(injected());
        }
        RecordStore::<R>::increment_usage(&self.inner, ctx, id).await
    }

    async fn remove(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError> {
        RecordStore::<R>::remove(&self.inner, ctx, id).await
    }

    async fn remove_expired(
        &self,
        ctx: &OpContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<R>, StorageError> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        if self.fail_sweep.load(Ordering::SeqCst) {
            return Err(injected());
        }
        RecordStore::<R>::remove_expired(&self.inner, ctx, now).await
    }
}

/// Blob store that can fail deletes and tracks open readers.
pub(crate) struct FlakyBlobs {
    inner: FsBlobStore,
    pub fail_delete: AtomicBool,
    pub deletes: AtomicUsize,
    open_readers: Arc<AtomicUsize>,
}

impl FlakyBlobs {
    pub(crate) fn new(inner: FsBlobStore) -> Self {
        Self {
            inner,
            fail_delete: AtomicBool::new(false),
            deletes: AtomicUsize::new(0),
            open_readers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Readers handed out by `get` that have not been dropped yet.
    pub(crate) fn open_readers(&self) -> usize {
        self.open_readers.load(Ordering::SeqCst)
    }
}

struct TrackedReader {
    inner: BlobReader,
    open: Arc<AtomicUsize>,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FlakyBlobs {
    async fn put(
        &self,
        ctx: &OpContext,
        key: &str,
        body: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.inner.put(ctx, key, body, size, content_type).await
    }

    async fn get(&self, ctx: &OpContext, key: &str) -> Result<BlobReader, StorageError> {
        let inner = self.inner.get(ctx, key).await?;
        self.open_readers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedReader {
            inner,
            open: self.open_readers.clone(),
        }))
    }

    async fn delete(&self, ctx: &OpContext, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.delete(ctx, key).await
    }

    fn url_for(&self, key: &str) -> String {
        self.inner.url_for(key)
    }
}
