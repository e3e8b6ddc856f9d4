//! File and paste lifecycle managers.
//!
//! Both managers share [`ExpiringResource`], which owns lookup, gating,
//! counter mutation and bulk expiry for one entity type. The managers add the
//! entity-specific parts: blob handling for files, detection for pastes.

mod files;
mod pastes;


pub use files::FileManager;
pub use pastes::PasteManager;

use crate::context::OpContext;
use crate::error::{AppError, StorageError};
use crate::gate::Gated;
use crate::store::RecordStore;
use chrono::Utc;
use std::sync::Arc;

/// Operation names attached to storage errors for one entity type.
pub(crate) struct Operations {
    pub noun: &'static str,
    pub insert: &'static str,
    pub find: &'static str,
    pub increment: &'static str,
    pub remove: &'static str,
    pub sweep: &'static str,
}

/// Expiring, usage-limited records of one entity type.
pub(crate) struct ExpiringResource<R> {
    store: Arc<dyn RecordStore<R>>,
    ops: &'static Operations,
}

impl<R: Gated + Send + Sync + 'static> ExpiringResource<R> {
    pub(crate) fn new(store: Arc<dyn RecordStore<R>>, ops: &'static Operations) -> Self {
        Self { store, ops }
    }

    /// Raw insert; callers decide how to report or compensate a failure.
    pub(crate) async fn insert(&self, ctx: &OpContext, record: &R) -> Result<(), StorageError> {
        self.store.insert(ctx, record).await
    }

    pub(crate) async fn find(&self, ctx: &OpContext, id: &str) -> Result<R, AppError> {
        self.store
            .find(ctx, id)
            .await
            .map_err(|err| AppError::storage(self.ops.find, id, err))
    }

    /// Look up `id` and run the access gate against the current time.
    pub(crate) async fn find_accessible(&self, ctx: &OpContext, id: &str) -> Result<R, AppError> {
        let record = self.find(ctx, id).await?;
        if let Err(err) = record.ensure_accessible(Utc::now()) {
            tracing::warn!(id, kind = self.ops.noun, "Access denied: {}", err);
            return Err(err);
        }
        Ok(record)
    }

    /// Count one access and return the stored counter value.
    pub(crate) async fn record_access(&self, ctx: &OpContext, id: &str) -> Result<u64, AppError> {
        self.store
            .increment_usage(ctx, id)
            .await
            .map_err(|err| AppError::storage(self.ops.increment, id, err))
    }

    pub(crate) async fn remove(&self, ctx: &OpContext, id: &str) -> Result<R, AppError> {
        self.store
            .remove(ctx, id)
            .await
            .map_err(|err| AppError::storage(self.ops.remove, id, err))
    }

    pub(crate) async fn remove_expired(&self, ctx: &OpContext) -> Result<Vec<R>, AppError> {
        self.store
            .remove_expired(ctx, Utc::now())
            .await
            .map_err(|err| AppError::storage(self.ops.sweep, "*", err))
    }
}
