//! Metadata storage backed by redb.

/// Generic record operations over a row table plus expiry index.
pub mod records;
/// redb table definitions.
pub mod tables;

#[cfg(test)]
mod tests;

use crate::constants::REDB_FILE_NAME;
use crate::context::OpContext;
use crate::error::StorageError;
use crate::models::{FileEntry, Paste};
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use records::StoredRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Database handle shared by the lifecycle managers.
///
/// Blocking redb work runs on the tokio blocking pool and is bounded by the
/// caller's [`OpContext`]. Reads are abandoned when the context fires. Writes
/// always run to completion and abort before commit once the context has
/// fired, so an error never hides a committed change.
#[derive(Clone)]
pub struct Database {
    pub db: Arc<redb::Database>,
}

impl Database {
    /// Open or create the database under `path`.
    ///
    /// `path` names a directory that will hold the redb file. A path with a
    /// `.redb` extension is used as the file itself.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or the file
    /// cannot be opened.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let file = resolve_db_file(Path::new(path));
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = redb::Database::create(&file)?;
        tracing::debug!("Opened metadata store at {}", file.display());
        Self::from_shared(Arc::new(db))
    }

    /// Build a handle over an already-open redb database, creating tables on
    /// first use.
    ///
    /// # Errors
    /// Returns an error when table creation fails.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, StorageError> {
        records::create_tables::<FileEntry>(&db)?;
        records::create_tables::<Paste>(&db)?;
        Ok(Self { db })
    }

    async fn read<T, F>(&self, ctx: &OpContext, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&redb::Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = self.db.clone();
        ctx.run(async move { tokio::task::spawn_blocking(move || work(&db)).await? })
            .await
    }

    async fn write<T, F>(&self, ctx: &OpContext, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&redb::Database, &OpContext) -> Result<T, StorageError> + Send + 'static,
    {
        ctx.check()?;
        let db = self.db.clone();
        let ctx = ctx.clone();
        tokio::task::spawn_blocking(move || work(&db, &ctx)).await?
    }
}

fn resolve_db_file(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "redb") {
        path.to_path_buf()
    } else {
        path.join(REDB_FILE_NAME)
    }
}

#[async_trait]
impl<R: StoredRecord> RecordStore<R> for Database {
    async fn insert(&self, ctx: &OpContext, record: &R) -> Result<(), StorageError> {
        let record = record.clone();
        self.write(ctx, move |db, ctx| records::insert(db, ctx, &record))
            .await
    }

    async fn find(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError> {
        let id = id.to_string();
        self.read(ctx, move |db| records::find(db, &id)).await
    }

    async fn increment_usage(&self, ctx: &OpContext, id: &str) -> Result<u64, StorageError> {
        let id = id.to_string();
        self.write(ctx, move |db, ctx| records::increment_usage::<R>(db, ctx, &id))
            .await
    }

    async fn remove(&self, ctx: &OpContext, id: &str) -> Result<R, StorageError> {
        let id = id.to_string();
        self.write(ctx, move |db, ctx| records::remove(db, ctx, &id))
            .await
    }

    async fn remove_expired(
        &self,
        ctx: &OpContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<R>, StorageError> {
        self.write(ctx, move |db, ctx| records::remove_expired(db, ctx, now))
            .await
    }
}
