//! Periodic expiry sweep task.
//!
//! The sweeper is owned by the process composition root. Lifecycle managers
//! only expose `cleanup_expired`; all timing lives here.

use crate::context::OpContext;
use crate::error::AppError;
use crate::lifecycle::{FileManager, PasteManager};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Something that can drop its expired content.
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Label used in sweep logs.
    fn name(&self) -> &'static str;

    /// Remove expired content and return how many records were removed.
    async fn cleanup_expired(&self, ctx: &OpContext) -> Result<usize, AppError>;
}

#[async_trait]
impl Sweep for FileManager {
    fn name(&self) -> &'static str {
        "files"
    }

    async fn cleanup_expired(&self, ctx: &OpContext) -> Result<usize, AppError> {
        FileManager::cleanup_expired(self, ctx).await
    }
}

#[async_trait]
impl Sweep for PasteManager {
    fn name(&self) -> &'static str {
        "pastes"
    }

    async fn cleanup_expired(&self, ctx: &OpContext) -> Result<usize, AppError> {
        PasteManager::cleanup_expired(self, ctx).await
    }
}

/// Runs every target's `cleanup_expired` once per interval until cancelled.
pub struct ExpirySweeper {
    targets: Vec<Arc<dyn Sweep>>,
    interval: Duration,
    run_timeout: Duration,
}

impl ExpirySweeper {
    /// `run_timeout` bounds each target's cleanup within a tick.
    pub fn new(targets: Vec<Arc<dyn Sweep>>, interval: Duration, run_timeout: Duration) -> Self {
        Self {
            targets,
            interval,
            run_timeout,
        }
    }

    /// Sweep every target once. A failing target is logged and does not stop
    /// the others.
    ///
    /// # Returns
    /// Total number of records removed.
    pub async fn sweep_once(&self, cancel: &CancellationToken) -> usize {
        let mut removed = 0usize;
        for target in &self.targets {
            let ctx = OpContext::with_timeout(self.run_timeout)
                .with_cancellation(cancel.child_token());
            match target.cleanup_expired(&ctx).await {
                Ok(count) => {
                    tracing::debug!(sweep = target.name(), removed = count, "Sweep finished");
                    removed += count;
                }
                Err(err) => {
                    tracing::error!(sweep = target.name(), error = %err, "Expiry sweep failed");
                }
            }
        }
        removed
    }

    /// Sweep on every tick until `cancel` fires. The first sweep happens one
    /// interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiry sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.sweep_once(&cancel).await;
                }
            }
        }
    }

    /// Run the sweeper on the current tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
