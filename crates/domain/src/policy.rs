//! Quota policy configuration and evaluation outcomes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use quotaguard_core::{AppError, AppResult, NonEmptyString};

use crate::{ActionKind, Exemption, ScopeMode, Subject};

/// Input payload for creating a quota policy.
#[derive(Debug, Clone)]
pub struct QuotaPolicyInput {
    /// Stable policy name, unique within a policy set.
    pub name: String,
    /// User-facing rejection message.
    pub message: String,
    /// Action kind counted by the policy.
    pub action_kind: ActionKind,
    /// Sliding lookback window.
    pub window: TimeDelta,
    /// Count at which the policy is violated.
    pub threshold: u32,
    /// Whether counting is restricted to the evaluated scope.
    pub scope_mode: ScopeMode,
    /// Optional predicate that skips the policy for a subject.
    pub exemption: Option<Exemption>,
    /// Count only events whose content equals the evaluated content key.
    pub filters_content: bool,
}

/// One immutable rate-limit rule.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    name: NonEmptyString,
    message: NonEmptyString,
    action_kind: ActionKind,
    window: TimeDelta,
    threshold: u32,
    scope_mode: ScopeMode,
    exemption: Option<Exemption>,
    filters_content: bool,
}

impl QuotaPolicy {
    /// Creates a validated quota policy.
    ///
    /// Fails with [`AppError::Configuration`] on a blank name or message, a
    /// zero threshold or a non-positive window.
    pub fn new(input: QuotaPolicyInput) -> AppResult<Self> {
        let name = NonEmptyString::new(input.name).map_err(|_| {
            AppError::Configuration("quota policy name must not be empty".to_owned())
        })?;
        let message = NonEmptyString::new(input.message).map_err(|_| {
            AppError::Configuration(format!(
                "quota policy '{name}' must have a rejection message"
            ))
        })?;

        if input.threshold == 0 {
            return Err(AppError::Configuration(format!(
                "quota policy '{name}' threshold must be at least 1"
            )));
        }

        if input.window <= TimeDelta::zero() {
            return Err(AppError::Configuration(format!(
                "quota policy '{name}' window must be greater than zero"
            )));
        }

        Ok(Self {
            name,
            message,
            action_kind: input.action_kind,
            window: input.window,
            threshold: input.threshold,
            scope_mode: input.scope_mode,
            exemption: input.exemption,
            filters_content: input.filters_content,
        })
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the user-facing rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the counted action kind.
    #[must_use]
    pub fn action_kind(&self) -> ActionKind {
        self.action_kind
    }

    /// Returns the lookback window.
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Returns the violation threshold.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns the scope mode.
    #[must_use]
    pub fn scope_mode(&self) -> ScopeMode {
        self.scope_mode
    }

    /// Returns whether the policy counts only matching content.
    #[must_use]
    pub fn filters_content(&self) -> bool {
        self.filters_content
    }

    /// Returns whether `subject` is exempt from this policy at `as_of`.
    #[must_use]
    pub fn is_exempt(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        self.exemption
            .as_ref()
            .is_some_and(|exemption| exemption.exempts(subject, as_of))
    }

    /// Returns the inclusive `[from, to]` window ending at `as_of`.
    pub fn window_bounds(&self, as_of: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let from = as_of.checked_sub_signed(self.window).ok_or_else(|| {
            AppError::Configuration(format!(
                "quota policy '{}' window reaches before the earliest representable instant",
                self.name
            ))
        })?;

        Ok((from, as_of))
    }

    /// Returns whether an observed count violates the policy.
    ///
    /// Reaching the threshold is already a violation.
    #[must_use]
    pub fn is_violated_by(&self, observed_count: u64) -> bool {
        observed_count >= u64::from(self.threshold)
    }
}

/// Ordered, read-only collection of quota policies.
///
/// Declaration order is evaluation order, which keeps the reported
/// violation stable when several policies are exceeded at once.
#[derive(Debug, Clone, Default)]
pub struct QuotaPolicySet {
    policies: Vec<Arc<QuotaPolicy>>,
}

impl QuotaPolicySet {
    /// Creates a policy set, rejecting duplicate policy names.
    pub fn new(policies: Vec<QuotaPolicy>) -> AppResult<Self> {
        let mut seen = HashSet::with_capacity(policies.len());
        for policy in &policies {
            if !seen.insert(policy.name().to_owned()) {
                return Err(AppError::Configuration(format!(
                    "duplicate quota policy name '{}'",
                    policy.name()
                )));
            }
        }

        Ok(Self {
            policies: policies.into_iter().map(Arc::new).collect(),
        })
    }

    /// Returns policies counting `action_kind`, in declaration order.
    pub fn for_action(&self, action_kind: ActionKind) -> impl Iterator<Item = &Arc<QuotaPolicy>> {
        self.policies
            .iter()
            .filter(move |policy| policy.action_kind() == action_kind)
    }

    /// Finds a policy by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<QuotaPolicy>> {
        self.policies.iter().find(|policy| policy.name() == name)
    }

    /// Returns the longest window of any policy.
    #[must_use]
    pub fn longest_window(&self) -> Option<TimeDelta> {
        self.policies.iter().map(|policy| policy.window()).max()
    }

    /// Returns the number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns whether the set holds no policies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// A violated policy together with the count observed at evaluation time.
#[derive(Debug, Clone)]
pub struct QuotaViolation {
    policy: Arc<QuotaPolicy>,
    observed_count: u64,
}

impl QuotaViolation {
    /// Creates a violation record.
    #[must_use]
    pub fn new(policy: Arc<QuotaPolicy>, observed_count: u64) -> Self {
        Self {
            policy,
            observed_count,
        }
    }

    /// Returns the violated policy.
    #[must_use]
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Returns the event count observed when the policy was checked.
    #[must_use]
    pub fn observed_count(&self) -> u64 {
        self.observed_count
    }

    /// Returns the user-facing rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.policy.message()
    }
}

/// Outcome of a quota evaluation.
#[derive(Debug, Clone)]
pub enum QuotaDecision {
    /// No applicable policy was violated.
    Allowed,
    /// The first violated policy in declaration order.
    Denied(QuotaViolation),
}

impl QuotaDecision {
    /// Returns whether the action may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the violation for a denied decision.
    #[must_use]
    pub fn violation(&self) -> Option<&QuotaViolation> {
        match self {
            Self::Allowed => None,
            Self::Denied(violation) => Some(violation),
        }
    }
}
