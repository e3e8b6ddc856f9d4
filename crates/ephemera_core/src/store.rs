//! Storage capabilities consumed by the lifecycle managers.
//!
//! Every call takes the caller's [`OpContext`] so cancellation and deadlines
//! reach the backend.

use crate::context::OpContext;
use crate::error::StorageError;
use crate::models::{FileEntry, Paste};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

/// Readable blob payload. Dropping it releases the underlying handle.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Keyed record storage for one entity type.
///
/// `find` and `remove` report a missing row as [`StorageError::NotFound`] and
/// every other failure as its own variant.
#[async_trait]
pub trait RecordStore<R>: Send + Sync {
    /// Persist a new record. Fails with [`StorageError::Duplicate`] when the id
    /// is taken.
    async fn insert(&self, ctx: &OpContext, record: &R) -> Result<(), StorageError>;

    async fn find(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError>;

    /// Atomically add one to the usage counter and return the new value.
    async fn increment_usage(&self, ctx: &OpContext, id: &str) -> Result<u64, StorageError>;

    /// Delete one record and return it.
    async fn remove(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError>;

    /// Delete every record whose expiry is before `now` and return them.
    async fn remove_expired(
        &self,
        ctx: &OpContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<R>, StorageError>;
}

/// Metadata storage for both entity types.
pub trait MetadataStore: RecordStore<FileEntry> + RecordStore<Paste> {}

impl<T> MetadataStore for T where T: RecordStore<FileEntry> + RecordStore<Paste> {}

/// Binary object storage keyed by opaque storage keys. Knows nothing about
/// expiry or counters.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store exactly `size` bytes from `body` under `key`.
    async fn put(
        &self,
        ctx: &OpContext,
        key: &str,
        body: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Open the blob for reading. Fails with [`StorageError::NotFound`] when
    /// the key is absent.
    async fn get(&self, ctx: &OpContext, key: &str) -> Result<BlobReader, StorageError>;

    /// Delete the blob. Deleting an absent key succeeds.
    async fn delete(&self, ctx: &OpContext, key: &str) -> Result<(), StorageError>;

    /// Locator for the blob within this store.
    fn url_for(&self, key: &str) -> String;
}
