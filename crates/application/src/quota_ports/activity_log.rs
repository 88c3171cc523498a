use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quotaguard_core::AppResult;
use quotaguard_domain::ActivityEvent;

/// Port for persisting user activity that quotas count.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends one activity event.
    async fn record(&self, event: &ActivityEvent) -> AppResult<()>;

    /// Removes events that occurred strictly before `cutoff`.
    ///
    /// Returns the number of removed events when the store can report it.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
