//! Expiry and usage-limit gating shared by files and pastes.

use crate::error::AppError;
use chrono::{DateTime, Utc};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Expired,
    LimitExceeded,
}

/// Decide whether an entity may be accessed at `now`.
///
/// Expiry is checked first, so an entity that is both expired and exhausted
/// reports [`Access::Expired`]. A non-positive `limit` means unlimited.
pub fn check_access(now: DateTime<Utc>, expires_at: DateTime<Utc>, usage: u64, limit: i64) -> Access {
    if now > expires_at {
        return Access::Expired;
    }
    if limit > 0 && usage >= limit as u64 {
        return Access::LimitExceeded;
    }
    Access::Granted
}

/// An expiring, usage-limited resource.
pub trait Gated {
    /// Instant after which the resource is no longer accessible.
    fn expires_at(&self) -> DateTime<Utc>;
    /// Number of successful gated accesses so far.
    fn usage(&self) -> u64;
    /// Usage cap; non-positive means unlimited.
    fn usage_limit(&self) -> i64;

    fn access(&self, now: DateTime<Utc>) -> Access {
        check_access(now, self.expires_at(), self.usage(), self.usage_limit())
    }

    /// Convert the access decision into the lifecycle error taxonomy.
    ///
    /// # Errors
    /// [`AppError::Expired`] or [`AppError::LimitExceeded`] when access is
    /// denied.
    fn ensure_accessible(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self.access(now) {
            Access::Granted => Ok(()),
            Access::Expired => Err(AppError::Expired),
            Access::LimitExceeded => Err(AppError::LimitExceeded),
        }
    }
}
