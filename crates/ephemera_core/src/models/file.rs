//! Shared binary file records.

use crate::constants::UNLIMITED;
use crate::gate::Gated;
use crate::ids::{new_id, new_storage_key, TokenGenerator};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// File metadata stored in the database.
///
/// `storage_key` binds the row to exactly one blob and is never exposed to
/// clients; API responses use [`FileInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    pub storage_key: String,
    pub downloads: u64,
    pub max_downloads: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Caller-supplied attributes of a new upload.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    pub ttl: Duration,
    /// Download cap; `None` means unlimited.
    pub max_downloads: Option<i64>,
}

impl FileEntry {
    /// Build a fresh record with generated id and storage key.
    pub fn new(tokens: &dyn TokenGenerator, new: NewFile, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(tokens),
            original_name: new.original_name,
            size: new.size,
            content_type: new.content_type,
            storage_key: new_storage_key(tokens, now),
            downloads: 0,
            max_downloads: new.max_downloads.unwrap_or(UNLIMITED),
            created_at: now,
            expires_at: now
                .checked_add_signed(new.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl Gated for FileEntry {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn usage(&self) -> u64 {
        self.downloads
    }

    fn usage_limit(&self) -> i64 {
        self.max_downloads
    }
}

/// Client-facing view of a [`FileEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    pub downloads: u64,
    pub max_downloads: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&FileEntry> for FileInfo {
    fn from(value: &FileEntry) -> Self {
        Self {
            id: value.id.clone(),
            original_name: value.original_name.clone(),
            size: value.size,
            content_type: value.content_type.clone(),
            downloads: value.downloads,
            max_downloads: value.max_downloads,
            created_at: value.created_at,
            expires_at: value.expires_at,
        }
    }
}

/// Name offered to the client for a download: `<stem>_<YYYYmmdd_HHMMSS><.ext>`.
pub fn download_file_name(original_name: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}_{}.{}", stem, stamp, ext)
        }
        _ => format!("{}_{}", original_name, stamp),
    }
}
