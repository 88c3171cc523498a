//! Purges recorded activity no quota window can still observe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use quotaguard_core::AppResult;
use quotaguard_domain::QuotaPolicySet;

use crate::quota_ports::{ActivityLog, Clock};

/// Application service for activity retention.
#[derive(Clone)]
pub struct ActivityRetentionService {
    log: Arc<dyn ActivityLog>,
    policies: Arc<QuotaPolicySet>,
    clock: Arc<dyn Clock>,
}

impl ActivityRetentionService {
    /// Creates a retention service.
    #[must_use]
    pub fn new(
        log: Arc<dyn ActivityLog>,
        policies: Arc<QuotaPolicySet>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log,
            policies,
            clock,
        }
    }

    /// Returns the instant before which events are invisible to every policy.
    ///
    /// `None` when the policy set is empty.
    #[must_use]
    pub fn retention_cutoff(&self, as_of: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.policies
            .longest_window()
            .and_then(|window| as_of.checked_sub_signed(window))
    }

    /// Removes expired activity. Intended for periodic cleanup.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let Some(cutoff) = self.retention_cutoff(self.clock.now()) else {
            return Ok(0);
        };

        let purged = self.log.purge_before(cutoff).await?;
        info!(purged, cutoff = %cutoff, "purged expired activity");

        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use quotaguard_core::{AppError, AppResult};
    use quotaguard_domain::{ActivityEvent, QuotaPolicySet};

    use super::ActivityRetentionService;
    use crate::quota_ports::{ActivityLog, FixedClock};
    use crate::quota_settings::{QuotaSettings, standard_policy_set};

    #[derive(Default)]
    struct TestActivityLog {
        cutoffs: Mutex<Vec<DateTime<Utc>>>,
    }

    #[async_trait]
    impl ActivityLog for TestActivityLog {
        async fn record(&self, _event: &ActivityEvent) -> AppResult<()> {
            Ok(())
        }

        async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
            self.cutoffs
                .lock()
                .map_err(|error| {
                    AppError::Internal(format!("failed to lock activity log state: {error}"))
                })?
                .push(cutoff);
            Ok(3)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 4, 9, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    #[tokio::test]
    async fn purges_events_older_than_longest_window() {
        let log = Arc::new(TestActivityLog::default());
        let policies = standard_policy_set(&QuotaSettings::default()).unwrap_or_default();
        let service = ActivityRetentionService::new(
            log.clone(),
            Arc::new(policies),
            Arc::new(FixedClock::new(now())),
        );

        let purged = service.purge_expired().await;

        assert_eq!(purged.ok(), Some(3));
        let cutoffs = log
            .cutoffs
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        assert_eq!(cutoffs, vec![now() - Duration::hours(24)]);
    }

    #[tokio::test]
    async fn empty_policy_set_purges_nothing() {
        let log = Arc::new(TestActivityLog::default());
        let service = ActivityRetentionService::new(
            log.clone(),
            Arc::new(QuotaPolicySet::default()),
            Arc::new(FixedClock::new(now())),
        );

        assert_eq!(service.purge_expired().await.ok(), Some(0));
        assert!(
            log.cutoffs
                .lock()
                .map(|guard| guard.is_empty())
                .unwrap_or(false)
        );
    }
}
