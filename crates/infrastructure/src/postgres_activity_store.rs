//! PostgreSQL-backed activity log and event counter using the
//! `activity_events` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use quotaguard_application::{ActivityLog, EventCountQuery, EventCounter};
use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::ActivityEvent;

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the activity log and event counter ports.
#[derive(Clone)]
pub struct PostgresActivityStore {
    pool: PgPool,
}

impl PostgresActivityStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for PostgresActivityStore {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_events (id, action_kind, subject_id, scope_name, content, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.action_kind().as_str())
        .bind(event.subject_id().as_str())
        .bind(event.scope().name().map(|name| name.as_str()))
        .bind(event.content())
        .bind(event.occurred_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to record activity event: {error}")))?;

        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM activity_events
            WHERE occurred_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to purge expired activity events: {error}"))
        })?;

        let purged = result.rows_affected();
        debug!(purged, cutoff = %cutoff, "purged activity events from postgres");

        Ok(purged)
    }
}

#[async_trait]
impl EventCounter for PostgresActivityStore {
    async fn count(&self, query: &EventCountQuery) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activity_events
            WHERE action_kind = $1
              AND LOWER(subject_id) = LOWER($2)
              AND occurred_at >= $3
              AND occurred_at <= $4
              AND ($5::TEXT IS NULL OR LOWER(scope_name) = LOWER($5))
              AND ($6::TEXT IS NULL OR LOWER(content) = LOWER($6))
            "#,
        )
        .bind(query.action_kind.as_str())
        .bind(query.subject_id.as_str())
        .bind(query.from)
        .bind(query.to)
        .bind(query.scope.as_ref().map(|scope| scope.as_str()))
        .bind(query.content_equals.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to count activity events: {error}")))?;

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid activity event count: {error}")))
    }
}
