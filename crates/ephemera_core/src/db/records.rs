//! Generic record storage over a canonical table plus an expiry index.

use super::tables::{FILES, FILES_BY_EXPIRY, PASTES, PASTES_BY_EXPIRY};
use crate::context::OpContext;
use crate::error::StorageError;
use crate::models::{FileEntry, Paste};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record persisted in its own redb table with an expiry index.
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Canonical rows keyed by id.
    const ROWS: TableDefinition<'static, &'static str, &'static [u8]>;
    /// `(expires_at_millis, id)` index used by the sweep.
    const BY_EXPIRY: TableDefinition<'static, (u64, &'static str), ()>;

    fn record_id(&self) -> &str;
    fn record_expires_at(&self) -> DateTime<Utc>;
    /// Add one to the usage counter and return the new value.
    fn bump_usage(&mut self) -> u64;
}

impl StoredRecord for FileEntry {
    const ROWS: TableDefinition<'static, &'static str, &'static [u8]> = FILES;
    const BY_EXPIRY: TableDefinition<'static, (u64, &'static str), ()> = FILES_BY_EXPIRY;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn bump_usage(&mut self) -> u64 {
        self.downloads = self.downloads.saturating_add(1);
        self.downloads
    }
}

impl StoredRecord for Paste {
    const ROWS: TableDefinition<'static, &'static str, &'static [u8]> = PASTES;
    const BY_EXPIRY: TableDefinition<'static, (u64, &'static str), ()> = PASTES_BY_EXPIRY;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn bump_usage(&mut self) -> u64 {
        self.views = self.views.saturating_add(1);
        self.views
    }
}

pub(crate) fn expiry_key(at: DateTime<Utc>) -> u64 {
    // Pre-epoch timestamps clamp to zero instead of underflowing.
    at.timestamp_millis().max(0) as u64
}

fn decode<R: StoredRecord>(bytes: &[u8]) -> Result<R, StorageError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn create_tables<R: StoredRecord>(db: &redb::Database) -> Result<(), StorageError> {
    let write_txn = db.begin_write()?;
    write_txn.open_table(R::ROWS)?;
    write_txn.open_table(R::BY_EXPIRY)?;
    write_txn.commit()?;
    Ok(())
}

/// Commit `write_txn` only while `ctx` is still live. Dropping the
/// transaction on the error path aborts it, so a caller that sees a context
/// error never has a committed write behind it.
fn commit_within(
    ctx: &OpContext,
    write_txn: redb::WriteTransaction,
) -> Result<(), StorageError> {
    ctx.check()?;
    write_txn.commit()?;
    Ok(())
}

pub(crate) fn insert<R: StoredRecord>(
    db: &redb::Database,
    ctx: &OpContext,
    record: &R,
) -> Result<(), StorageError> {
    let id = record.record_id();
    let encoded = bincode::serialize(record)?;
    let expiry = expiry_key(record.record_expires_at());

    let write_txn = db.begin_write()?;
    {
        let mut rows = write_txn.open_table(R::ROWS)?;
        let mut by_expiry = write_txn.open_table(R::BY_EXPIRY)?;

        if rows.get(id)?.is_some() {
            return Err(StorageError::Duplicate(id.to_string()));
        }

        rows.insert(id, encoded.as_slice())?;
        by_expiry.insert((expiry, id), ())?;
    }
    commit_within(ctx, write_txn)
}

pub(crate) fn find<R: StoredRecord>(db: &redb::Database, id: &str) -> Result<R, StorageError> {
    let read_txn = db.begin_read()?;
    let rows = read_txn.open_table(R::ROWS)?;
    match rows.get(id)? {
        Some(value) => decode(value.value()),
        None => Err(StorageError::NotFound),
    }
}

/// Read, bump and write back the counter inside one write transaction. redb
/// serializes write transactions, so concurrent increments never lose updates.
pub(crate) fn increment_usage<R: StoredRecord>(
    db: &redb::Database,
    ctx: &OpContext,
    id: &str,
) -> Result<u64, StorageError> {
    let write_txn = db.begin_write()?;
    let count = {
        let mut rows = write_txn.open_table(R::ROWS)?;
        let Some(guard) = rows.get(id)? else {
            return Err(StorageError::NotFound);
        };
        let mut record: R = decode(guard.value())?;
        drop(guard);

        let count = record.bump_usage();
        let encoded = bincode::serialize(&record)?;
        rows.insert(id, encoded.as_slice())?;
        count
    };
    commit_within(ctx, write_txn)?;
    Ok(count)
}

pub(crate) fn remove<R: StoredRecord>(
    db: &redb::Database,
    ctx: &OpContext,
    id: &str,
) -> Result<R, StorageError> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut rows = write_txn.open_table(R::ROWS)?;
        let mut by_expiry = write_txn.open_table(R::BY_EXPIRY)?;

        let Some(guard) = rows.remove(id)? else {
            return Err(StorageError::NotFound);
        };
        let record: R = decode(guard.value())?;
        drop(guard);

        let _ = by_expiry.remove((expiry_key(record.record_expires_at()), id))?;
        record
    };
    commit_within(ctx, write_txn)?;
    Ok(record)
}

pub(crate) fn remove_expired<R: StoredRecord>(
    db: &redb::Database,
    ctx: &OpContext,
    now: DateTime<Utc>,
) -> Result<Vec<R>, StorageError> {
    let cutoff = expiry_key(now);
    let write_txn = db.begin_write()?;
    let removed = {
        let mut rows = write_txn.open_table(R::ROWS)?;
        let mut by_expiry = write_txn.open_table(R::BY_EXPIRY)?;

        // Keys strictly below (cutoff, "") expired before the current millisecond.
        let mut due: Vec<(u64, String)> = Vec::new();
        for item in by_expiry.range(..(cutoff, ""))? {
            let (key, _) = item?;
            let (at, id) = key.value();
            due.push((at, id.to_string()));
        }

        let mut removed = Vec::with_capacity(due.len());
        for (at, id) in &due {
            let _ = by_expiry.remove((*at, id.as_str()))?;
            if let Some(guard) = rows.remove(id.as_str())? {
                removed.push(decode(guard.value())?);
            }
        }
        removed
    };
    commit_within(ctx, write_txn)?;
    Ok(removed)
}
