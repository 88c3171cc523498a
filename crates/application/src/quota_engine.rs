//! Quota evaluation service.
//!
//! Evaluates the policies configured for an action kind, in declaration
//! order, against counts supplied by an [`EventCounter`]. The first violated
//! policy wins and no further policies are counted. The engine holds no
//! mutable state, so one instance can be shared across request handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::{
    ActionKind, QuotaDecision, QuotaPolicy, QuotaPolicySet, QuotaViolation, Scope, ScopeMode,
    Subject,
};

use crate::quota_ports::{Clock, EventCountQuery, EventCounter};


/// One action to be checked against quotas.
#[derive(Debug, Clone)]
pub struct QuotaRequest {
    /// Action kind being attempted.
    pub action_kind: ActionKind,
    /// Acting user.
    pub subject: Subject,
    /// Targeted scope.
    pub scope: Scope,
    /// Content compared by content-filtering policies, such as a submitted link.
    pub content_key: Option<String>,
}

impl QuotaRequest {
    /// Creates a request without a content key.
    #[must_use]
    pub fn new(action_kind: ActionKind, subject: Subject, scope: Scope) -> Self {
        Self {
            action_kind,
            subject,
            scope,
            content_key: None,
        }
    }

    /// Sets the content key.
    #[must_use]
    pub fn with_content_key(mut self, content_key: impl Into<String>) -> Self {
        self.content_key = Some(content_key.into());
        self
    }
}

/// Application service evaluating quota policies.
#[derive(Clone)]
pub struct QuotaEngine {
    counter: Arc<dyn EventCounter>,
    policies: Arc<QuotaPolicySet>,
    clock: Arc<dyn Clock>,
    count_timeout: Option<Duration>,
}

impl QuotaEngine {
    /// Creates a quota engine.
    #[must_use]
    pub fn new(
        counter: Arc<dyn EventCounter>,
        policies: Arc<QuotaPolicySet>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            counter,
            policies,
            clock,
            count_timeout: None,
        }
    }

    /// Bounds every counter call. An expired call aborts evaluation with
    /// `AppError::Cancelled`.
    #[must_use]
    pub fn with_count_timeout(mut self, timeout: Duration) -> Self {
        self.count_timeout = Some(timeout);
        self
    }

    /// Evaluates `request` at the clock's current instant.
    ///
    /// The clock is read once, so every policy shares the same window end.
    pub async fn evaluate_now(&self, request: &QuotaRequest) -> AppResult<QuotaDecision> {
        let as_of = self.clock.now();
        self.evaluate(request, as_of).await
    }

    /// Evaluates `request` with every window ending at `as_of`.
    ///
    /// Returns `Denied` for the first violated policy in declaration order.
    /// Counter failures propagate unchanged; a missing scope or content key
    /// required by a policy is an `AppError::Configuration`.
    pub async fn evaluate(
        &self,
        request: &QuotaRequest,
        as_of: DateTime<Utc>,
    ) -> AppResult<QuotaDecision> {
        for policy in self.policies.for_action(request.action_kind) {
            if policy.is_exempt(&request.subject, as_of) {
                debug!(
                    policy = policy.name(),
                    subject = %request.subject.id(),
                    "subject exempt from quota policy"
                );
                continue;
            }

            let query = count_query(policy, request, as_of)?;
            let observed_count = self.count(policy, &query).await?;

            debug!(
                policy = policy.name(),
                subject = %request.subject.id(),
                observed_count,
                threshold = policy.threshold(),
                "quota policy checked"
            );

            if policy.is_violated_by(observed_count) {
                info!(
                    policy = policy.name(),
                    subject = %request.subject.id(),
                    scope = %request.scope,
                    observed_count,
                    threshold = policy.threshold(),
                    "quota exceeded"
                );
                return Ok(QuotaDecision::Denied(QuotaViolation::new(
                    Arc::clone(policy),
                    observed_count,
                )));
            }
        }

        Ok(QuotaDecision::Allowed)
    }

    async fn count(&self, policy: &QuotaPolicy, query: &EventCountQuery) -> AppResult<u64> {
        let result = match self.count_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.counter.count(query))
                .await
                .map_err(|_| {
                    AppError::Cancelled(format!(
                        "event count for quota policy '{}' timed out after {} ms",
                        policy.name(),
                        timeout.as_millis()
                    ))
                })
                .and_then(|result| result),
            None => self.counter.count(query).await,
        };

        result.inspect_err(|error| {
            warn!(
                policy = policy.name(),
                subject = %query.subject_id,
                error = %error,
                "quota evaluation aborted"
            );
        })
    }
}

fn count_query(
    policy: &QuotaPolicy,
    request: &QuotaRequest,
    as_of: DateTime<Utc>,
) -> AppResult<EventCountQuery> {
    let (from, to) = policy.window_bounds(as_of)?;

    let scope = match policy.scope_mode() {
        ScopeMode::Global => None,
        ScopeMode::PerScope => Some(request.scope.name().cloned().ok_or_else(|| {
            AppError::Configuration(format!(
                "quota policy '{}' counts per scope but the {} action has no community scope",
                policy.name(),
                request.action_kind
            ))
        })?),
    };

    let content_equals = if policy.filters_content() {
        Some(request.content_key.clone().ok_or_else(|| {
            AppError::Configuration(format!(
                "quota policy '{}' filters by content but the {} action has no content key",
                policy.name(),
                request.action_kind
            ))
        })?)
    } else {
        None
    };

    Ok(EventCountQuery {
        action_kind: request.action_kind,
        subject_id: request.subject.id().clone(),
        from,
        to,
        scope,
        content_equals,
    })
}
