//! Redis-backed activity log and event counter.
//!
//! Every event is written to one sorted set per filter combination it can be
//! counted under (all scopes, its scope, its content, its scope and content),
//! scored by occurrence time in whole microseconds, the same resolution
//! PostgreSQL timestamps keep. Counting is a single `ZCOUNT` over the set
//! matching the query's filters.
//!
//! Subject ids, scope names and content are lowercased and hashed before they
//! become key segments, so no user-supplied value can contain the `:`
//! separator.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use redis::Script;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use quotaguard_application::{ActivityLog, EventCountQuery, EventCounter};
use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::{ActionKind, ActivityEvent};

const RECORD_EVENT_SCRIPT: &str = r#"
local score = ARGV[1]
local member = ARGV[2]
local retention_ms = ARGV[3]
local trim_before = ARGV[4]

for _, key in ipairs(KEYS) do
  redis.call('ZADD', key, score, member)
  redis.call('ZREMRANGEBYSCORE', key, '-inf', trim_before)
  redis.call('PEXPIRE', key, retention_ms)
end

return #KEYS
"#;

/// Redis implementation of the activity log and event counter ports.
#[derive(Clone)]
pub struct RedisActivityStore {
    client: redis::Client,
    key_prefix: String,
    retention: TimeDelta,
}

impl RedisActivityStore {
    /// Creates a store with a configured Redis client, key prefix and the
    /// longest window events must stay countable for.
    pub fn new(
        client: redis::Client,
        key_prefix: impl Into<String>,
        retention: TimeDelta,
    ) -> AppResult<Self> {
        if retention <= TimeDelta::zero() {
            return Err(AppError::Configuration(
                "redis activity retention must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            retention,
        })
    }

    fn key_for(
        &self,
        action_kind: ActionKind,
        subject_id: &str,
        scope: Option<&str>,
        content: Option<&str>,
    ) -> String {
        let mut key = format!(
            "{}:{}:{}",
            self.key_prefix,
            action_kind.as_str(),
            segment_digest(subject_id)
        );

        match scope {
            Some(scope) => {
                key.push_str(":scope:");
                key.push_str(segment_digest(scope).as_str());
            }
            None => key.push_str(":all"),
        }

        if let Some(content) = content {
            key.push_str(":content:");
            key.push_str(segment_digest(content).as_str());
        }

        key
    }

    fn keys_for_event(&self, event: &ActivityEvent) -> Vec<String> {
        let action_kind = event.action_kind();
        let subject_id = event.subject_id().as_str();
        let scope = event.scope().name().map(|name| name.as_str());
        let content = event.content();

        let mut keys = vec![self.key_for(action_kind, subject_id, None, None)];
        if let Some(content) = content {
            keys.push(self.key_for(action_kind, subject_id, None, Some(content)));
        }
        if let Some(scope) = scope {
            keys.push(self.key_for(action_kind, subject_id, Some(scope), None));
            if let Some(content) = content {
                keys.push(self.key_for(action_kind, subject_id, Some(scope), Some(content)));
            }
        }

        keys
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }
}

fn segment_digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.to_lowercase().as_bytes()))
}

fn event_score(occurred_at: DateTime<Utc>) -> i64 {
    occurred_at.timestamp_micros()
}

/// Smallest stored score not earlier than `from`.
fn lower_score_bound(from: DateTime<Utc>) -> i64 {
    let micros = from.timestamp_micros();
    if from.timestamp_subsec_nanos() % 1_000 == 0 {
        micros
    } else {
        micros + 1
    }
}

/// Largest stored score not later than `to`.
fn upper_score_bound(to: DateTime<Utc>) -> i64 {
    to.timestamp_micros()
}

#[async_trait]
impl ActivityLog for RedisActivityStore {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        let mut connection = self.connection().await?;

        let keys = self.keys_for_event(event);
        let key_count = keys.len();
        let script = Script::new(RECORD_EVENT_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(key);
        }

        let score = event_score(event.occurred_at());
        let retention_micros = self.retention.num_microseconds().ok_or_else(|| {
            AppError::Configuration("redis activity retention is too large".to_owned())
        })?;

        let _: i64 = invocation
            .arg(score)
            .arg(Uuid::new_v4().to_string())
            .arg(self.retention.num_milliseconds())
            .arg(format!("({}", score.saturating_sub(retention_micros)))
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to record redis activity event: {error}"))
            })?;

        debug!(
            action_kind = %event.action_kind(),
            subject = %event.subject_id(),
            key_count,
            "recorded activity event in redis"
        );

        Ok(())
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> AppResult<u64> {
        // Sorted sets are trimmed on every write and expire via TTL.
        Ok(0)
    }
}

#[async_trait]
impl EventCounter for RedisActivityStore {
    async fn count(&self, query: &EventCountQuery) -> AppResult<u64> {
        let key = self.key_for(
            query.action_kind,
            query.subject_id.as_str(),
            query.scope.as_ref().map(|scope| scope.as_str()),
            query.content_equals.as_deref(),
        );
        let mut connection = self.connection().await?;

        let count: u64 = redis::cmd("ZCOUNT")
            .arg(key)
            .arg(lower_score_bound(query.from))
            .arg(upper_score_bound(query.to))
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to count redis activity events: {error}"))
            })?;

        Ok(count)
    }
}
