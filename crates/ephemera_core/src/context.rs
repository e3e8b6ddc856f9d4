//! Cancellation and deadline propagation for storage calls.

use crate::error::StorageError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied bound for one logical operation.
///
/// Lifecycle managers forward the context to every storage call they make, and
/// storage implementations run their work through [`OpContext::run`].
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Context without a deadline that is only cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Bind this context to an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancel this context and every clone sharing its token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail fast when the context is already cancelled or past its deadline.
    ///
    /// # Errors
    /// Returns [`StorageError::Cancelled`] or [`StorageError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), StorageError> {
        if self.cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
            return Err(StorageError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `work` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    ///
    /// # Errors
    /// Returns the error of `work`, or [`StorageError::Cancelled`] /
    /// [`StorageError::DeadlineExceeded`] when the bound fires first.
    pub async fn run<T, F>(&self, work: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        self.check()?;
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StorageError::Cancelled),
            _ = expired => Err(StorageError::DeadlineExceeded),
            result = work => result,
        }
    }
}
