//! Shared text paste records.

use crate::constants::UNLIMITED;
use crate::gate::Gated;
use crate::ids::{new_id, TokenGenerator};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Paste stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub language: String,
    pub title: Option<String>,
    pub views: u64,
    pub max_views: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Caller-supplied attributes of a new paste.
#[derive(Debug, Clone)]
pub struct NewPaste {
    pub content: String,
    /// Language tag; `None` or blank triggers detection.
    pub language: Option<String>,
    pub title: Option<String>,
    pub ttl: Duration,
    /// View cap; `None` means unlimited.
    pub max_views: Option<i64>,
}

impl Paste {
    /// Build a fresh record with a generated id. `language` must already be
    /// resolved.
    pub fn new(
        tokens: &dyn TokenGenerator,
        new: NewPaste,
        language: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(tokens),
            content: new.content,
            language,
            title: new.title,
            views: 0,
            max_views: new.max_views.unwrap_or(UNLIMITED),
            created_at: now,
            expires_at: now
                .checked_add_signed(new.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl Gated for Paste {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn usage(&self) -> u64 {
        self.views
    }

    fn usage_limit(&self) -> i64 {
        self.max_views
    }
}
