//! Startup quota thresholds and the standard policy catalogue built from them.

use chrono::TimeDelta;

use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::{
    ActionKind, Exemption, QuotaPolicy, QuotaPolicyInput, QuotaPolicySet, ScopeMode,
};

/// Numeric quota thresholds supplied by configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSettings {
    /// Submissions per community per hour.
    pub hourly_posting_quota_per_scope: u32,
    /// Submissions per community per day.
    pub daily_posting_quota_per_scope: u32,
    /// Site-wide submissions per hour for new, low-scoring accounts.
    pub hourly_global_posting_quota: u32,
    /// Site-wide submissions per day for new, low-scoring accounts.
    pub daily_global_posting_quota: u32,
    /// Site-wide submissions per day for accounts with negative submission points.
    pub daily_posting_quota_for_negative_score: u32,
    /// Submissions of the same content per day.
    pub daily_cross_posting_quota: u32,
    /// Comments per hour.
    pub hourly_comment_posting_quota: u32,
    /// Comments per day.
    pub daily_comment_posting_quota: u32,
    /// Comments per day for accounts with negative comment points.
    pub daily_comment_posting_quota_for_negative_score: u32,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            hourly_posting_quota_per_scope: 10,
            daily_posting_quota_per_scope: 10,
            hourly_global_posting_quota: 5,
            daily_global_posting_quota: 10,
            daily_posting_quota_for_negative_score: 3,
            daily_cross_posting_quota: 2,
            hourly_comment_posting_quota: 10,
            daily_comment_posting_quota: 20,
            daily_comment_posting_quota_for_negative_score: 10,
        }
    }
}

impl QuotaSettings {
    /// Loads settings through a variable lookup, falling back to defaults for
    /// unset variables.
    ///
    /// Variable names are `QUOTA_` followed by the upper-cased field name.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            hourly_posting_quota_per_scope: parse_u32(
                &lookup,
                "QUOTA_HOURLY_POSTING_QUOTA_PER_SCOPE",
                defaults.hourly_posting_quota_per_scope,
            )?,
            daily_posting_quota_per_scope: parse_u32(
                &lookup,
                "QUOTA_DAILY_POSTING_QUOTA_PER_SCOPE",
                defaults.daily_posting_quota_per_scope,
            )?,
            hourly_global_posting_quota: parse_u32(
                &lookup,
                "QUOTA_HOURLY_GLOBAL_POSTING_QUOTA",
                defaults.hourly_global_posting_quota,
            )?,
            daily_global_posting_quota: parse_u32(
                &lookup,
                "QUOTA_DAILY_GLOBAL_POSTING_QUOTA",
                defaults.daily_global_posting_quota,
            )?,
            daily_posting_quota_for_negative_score: parse_u32(
                &lookup,
                "QUOTA_DAILY_POSTING_QUOTA_FOR_NEGATIVE_SCORE",
                defaults.daily_posting_quota_for_negative_score,
            )?,
            daily_cross_posting_quota: parse_u32(
                &lookup,
                "QUOTA_DAILY_CROSS_POSTING_QUOTA",
                defaults.daily_cross_posting_quota,
            )?,
            hourly_comment_posting_quota: parse_u32(
                &lookup,
                "QUOTA_HOURLY_COMMENT_POSTING_QUOTA",
                defaults.hourly_comment_posting_quota,
            )?,
            daily_comment_posting_quota: parse_u32(
                &lookup,
                "QUOTA_DAILY_COMMENT_POSTING_QUOTA",
                defaults.daily_comment_posting_quota,
            )?,
            daily_comment_posting_quota_for_negative_score: parse_u32(
                &lookup,
                "QUOTA_DAILY_COMMENT_POSTING_QUOTA_FOR_NEGATIVE_SCORE",
                defaults.daily_comment_posting_quota_for_negative_score,
            )?,
        })
    }
}

fn parse_u32<F>(lookup: &F, name: &str, default: u32) -> AppResult<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

/// Builds the standard submission and comment quotas.
///
/// Submission policies are declared per-community first, then site-wide,
/// then duplicate content. Submission callers must pass a content key: the
/// link for link posts, the body for text posts. Text posts with identical
/// bodies therefore count toward `daily_cross_posting_quota` like repeated
/// links do.
pub fn standard_policy_set(settings: &QuotaSettings) -> AppResult<QuotaPolicySet> {
    let hour = TimeDelta::hours(1);
    let day = TimeDelta::hours(24);

    let inputs = vec![
        QuotaPolicyInput {
            name: "hourly_posting_quota_per_scope".to_owned(),
            message: "You have reached your hourly submission quota for this community."
                .to_owned(),
            action_kind: ActionKind::Submission,
            window: hour,
            threshold: settings.hourly_posting_quota_per_scope,
            scope_mode: ScopeMode::PerScope,
            exemption: None,
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_posting_quota_per_scope".to_owned(),
            message: "You have reached your daily submission quota for this community."
                .to_owned(),
            action_kind: ActionKind::Submission,
            window: day,
            threshold: settings.daily_posting_quota_per_scope,
            scope_mode: ScopeMode::PerScope,
            exemption: None,
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "hourly_global_posting_quota".to_owned(),
            message: "You have reached your hourly submission quota.".to_owned(),
            action_kind: ActionKind::Submission,
            window: hour,
            threshold: settings.hourly_global_posting_quota,
            scope_mode: ScopeMode::Global,
            exemption: Some(Exemption::established_account()),
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_global_posting_quota".to_owned(),
            message: "You have reached your daily submission quota.".to_owned(),
            action_kind: ActionKind::Submission,
            window: day,
            threshold: settings.daily_global_posting_quota,
            scope_mode: ScopeMode::Global,
            exemption: Some(Exemption::established_account()),
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_posting_quota_for_negative_score".to_owned(),
            message: "You have reached your daily submission quota. Your submission score is \
                      negative."
                .to_owned(),
            action_kind: ActionKind::Submission,
            window: day,
            threshold: settings.daily_posting_quota_for_negative_score,
            scope_mode: ScopeMode::Global,
            exemption: Some(Exemption::submission_points_at_least(0)),
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_cross_posting_quota".to_owned(),
            message: "You have already submitted this content too many times today.".to_owned(),
            action_kind: ActionKind::Submission,
            window: day,
            threshold: settings.daily_cross_posting_quota,
            scope_mode: ScopeMode::Global,
            exemption: None,
            filters_content: true,
        },
        QuotaPolicyInput {
            name: "hourly_comment_posting_quota".to_owned(),
            message: "You have reached your hourly comment quota.".to_owned(),
            action_kind: ActionKind::Comment,
            // 59 minutes, not a full hour.
            window: TimeDelta::minutes(59),
            threshold: settings.hourly_comment_posting_quota,
            scope_mode: ScopeMode::Global,
            exemption: None,
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_comment_posting_quota".to_owned(),
            message: "You have reached your daily comment quota.".to_owned(),
            action_kind: ActionKind::Comment,
            window: day,
            threshold: settings.daily_comment_posting_quota,
            scope_mode: ScopeMode::Global,
            exemption: None,
            filters_content: false,
        },
        QuotaPolicyInput {
            name: "daily_comment_posting_quota_for_negative_score".to_owned(),
            message: "You have reached your daily comment quota. Your comment score is negative."
                .to_owned(),
            action_kind: ActionKind::Comment,
            window: day,
            threshold: settings.daily_comment_posting_quota_for_negative_score,
            scope_mode: ScopeMode::Global,
            exemption: Some(Exemption::comment_points_at_least(0)),
            filters_content: false,
        },
    ];

    let policies = inputs
        .into_iter()
        .map(QuotaPolicy::new)
        .collect::<AppResult<Vec<_>>>()?;

    QuotaPolicySet::new(policies)
}
