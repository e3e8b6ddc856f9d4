//! Text paste lifecycle: create, gated get, raw get, delete and sweep.

use super::{ExpiringResource, Operations};
use crate::context::OpContext;
use crate::detection::{detect_or_unknown, HeuristicDetector, LanguageDetector};
use crate::error::AppError;
use crate::ids::{RandomTokens, TokenGenerator};
use crate::models::{NewPaste, Paste};
use crate::store::RecordStore;
use crate::text::{normalize_language, normalize_optional_nonempty};
use crate::ttl::expiry_after;
use chrono::Utc;
use std::sync::Arc;

static PASTE_OPS: Operations = Operations {
    noun: "paste",
    insert: "store paste",
    find: "find paste",
    increment: "increment views",
    remove: "remove paste",
    sweep: "remove expired pastes",
};

/// Orchestrates text pastes stored inline in the metadata store.
pub struct PasteManager {
    records: ExpiringResource<Paste>,
    detector: Arc<dyn LanguageDetector>,
    tokens: Arc<dyn TokenGenerator>,
    max_content_size: Option<usize>,
}

impl PasteManager {
    pub fn new(records: Arc<dyn RecordStore<Paste>>) -> Self {
        Self {
            records: ExpiringResource::new(records, &PASTE_OPS),
            detector: Arc::new(HeuristicDetector),
            tokens: Arc::new(RandomTokens),
            max_content_size: None,
        }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Reject pastes whose content exceeds `bytes`.
    #[must_use]
    pub fn with_max_content_size(mut self, bytes: usize) -> Self {
        self.max_content_size = Some(bytes);
        self
    }

    /// Create a paste, detecting the language when none is given.
    ///
    /// # Errors
    /// [`AppError::InvalidInput`] for empty or oversized content or a
    /// non-positive TTL; a storage failure when the row cannot be written.
    pub async fn create(&self, ctx: &OpContext, new: NewPaste) -> Result<Paste, AppError> {
        if new.content.is_empty() {
            return Err(AppError::InvalidInput("content is required".to_string()));
        }
        if let Some(limit) = self.max_content_size {
            if new.content.len() > limit {
                return Err(AppError::InvalidInput(format!(
                    "content exceeds {} bytes",
                    limit
                )));
            }
        }
        let now = Utc::now();
        expiry_after(now, new.ttl)?;

        let language = normalize_language(new.language.as_deref())
            .unwrap_or_else(|| detect_or_unknown(self.detector.as_ref(), &new.content));
        let title = normalize_optional_nonempty(new.title.clone());
        let paste = Paste::new(
            self.tokens.as_ref(),
            NewPaste { title, ..new },
            language,
            now,
        );

        self.records
            .insert(ctx, &paste)
            .await
            .map_err(|err| AppError::storage(PASTE_OPS.insert, &paste.id, err))?;
        tracing::info!(paste_id = %paste.id, language = %paste.language, "Paste created");
        Ok(paste)
    }

    /// Gated read that counts one view. The returned paste carries the
    /// incremented counter.
    ///
    /// # Errors
    /// [`AppError::NotFound`], [`AppError::Expired`], [`AppError::LimitExceeded`]
    /// or a storage failure.
    pub async fn get(&self, ctx: &OpContext, id: &str) -> Result<Paste, AppError> {
        let mut paste = self.records.find_accessible(ctx, id).await?;
        paste.views = self.records.record_access(ctx, id).await?;
        tracing::debug!(paste_id = %id, views = paste.views, "Paste viewed");
        Ok(paste)
    }

    /// Content only. Counts a view exactly like [`PasteManager::get`], so a
    /// client calling both records two views.
    ///
    /// # Errors
    /// Same as [`PasteManager::get`].
    pub async fn get_raw(&self, ctx: &OpContext, id: &str) -> Result<String, AppError> {
        Ok(self.get(ctx, id).await?.content)
    }

    /// # Errors
    /// [`AppError::NotFound`] for unknown ids, or a storage failure.
    pub async fn delete(&self, ctx: &OpContext, id: &str) -> Result<(), AppError> {
        self.records.remove(ctx, id).await?;
        tracing::info!(paste_id = %id, "Paste deleted");
        Ok(())
    }

    /// Remove every expired paste.
    ///
    /// # Returns
    /// Number of pastes removed.
    ///
    /// # Errors
    /// A storage failure from the bulk delete.
    pub async fn cleanup_expired(&self, ctx: &OpContext) -> Result<usize, AppError> {
        let removed = self.records.remove_expired(ctx).await?.len();
        if removed > 0 {
            tracing::info!(removed, "Removed expired pastes");
        }
        Ok(removed)
    }
}
