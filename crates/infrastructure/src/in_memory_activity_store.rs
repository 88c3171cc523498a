use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quotaguard_application::{ActivityLog, EventCountQuery, EventCounter};
use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::ActivityEvent;
use tokio::sync::RwLock;

/// In-memory activity log and event counter.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    events: RwLock<Vec<ActivityEvent>>,
}

impl InMemoryActivityStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityStore {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|event| event.occurred_at() >= cutoff);

        u64::try_from(before - events.len())
            .map_err(|error| AppError::Internal(format!("invalid purge count: {error}")))
    }
}

#[async_trait]
impl EventCounter for InMemoryActivityStore {
    async fn count(&self, query: &EventCountQuery) -> AppResult<u64> {
        let matched = self
            .events
            .read()
            .await
            .iter()
            .filter(|event| query.matches(event))
            .count();

        u64::try_from(matched)
            .map_err(|error| AppError::Internal(format!("invalid event count: {error}")))
    }
}
