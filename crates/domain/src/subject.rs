//! Acting user and the kinds of actions that count against quotas.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quotaguard_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Kinds of user actions tracked by quota policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A new post to a community.
    Submission,
    /// A comment on an existing post.
    Comment,
}

impl ActionKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Comment => "comment",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "submission" => Ok(Self::Submission),
            "comment" => Ok(Self::Comment),
            _ => Err(AppError::Validation(format!(
                "unknown action kind '{value}'"
            ))),
        }
    }
}

/// Stable identifier of the acting user.
///
/// Identifiers are compared case-insensitively by event stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(NonEmptyString);

impl SubjectId {
    /// Creates a validated subject identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SubjectId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The user an action is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    id: SubjectId,
    registered_at: DateTime<Utc>,
    submission_points: i64,
    comment_points: i64,
}

impl Subject {
    /// Creates a subject with zero points.
    #[must_use]
    pub fn new(id: SubjectId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            registered_at,
            submission_points: 0,
            comment_points: 0,
        }
    }

    /// Sets the cumulative submission point score.
    #[must_use]
    pub fn with_submission_points(mut self, points: i64) -> Self {
        self.submission_points = points;
        self
    }

    /// Sets the cumulative comment point score.
    #[must_use]
    pub fn with_comment_points(mut self, points: i64) -> Self {
        self.comment_points = points;
        self
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    /// Returns the cumulative submission point score.
    #[must_use]
    pub fn submission_points(&self) -> i64 {
        self.submission_points
    }

    /// Returns the cumulative comment point score.
    #[must_use]
    pub fn comment_points(&self) -> i64 {
        self.comment_points
    }

    /// Returns the account age in whole days at `as_of`.
    ///
    /// Partial days are truncated toward zero.
    #[must_use]
    pub fn account_age_days(&self, as_of: DateTime<Utc>) -> i64 {
        (as_of - self.registered_at).num_days()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{ActionKind, Subject, SubjectId};

    #[test]
    fn action_kind_round_trips_storage_value() {
        for kind in [ActionKind::Submission, ActionKind::Comment] {
            assert_eq!(kind.as_str().parse::<ActionKind>().ok(), Some(kind));
        }
        assert!("vote".parse::<ActionKind>().is_err());
    }

    #[test]
    fn action_kind_serializes_as_snake_case() {
        let value = serde_json::to_value(ActionKind::Submission).unwrap_or_default();
        assert_eq!(value, serde_json::json!("submission"));
    }

    #[test]
    fn subject_id_rejects_blank_values() {
        assert!(SubjectId::new("").is_err());
        assert!(SubjectId::new("  ").is_err());
        assert!(SubjectId::new("alice").is_ok());
    }

    #[test]
    fn account_age_truncates_partial_days() {
        let registered_at = Utc
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        let subject = Subject::new(
            SubjectId::new("alice").unwrap_or_else(|_| unreachable!()),
            registered_at,
        );

        let almost_two_days = registered_at + Duration::days(2) - Duration::seconds(1);
        assert_eq!(subject.account_age_days(almost_two_days), 1);
        assert_eq!(subject.account_age_days(registered_at + Duration::days(2)), 2);
    }
}
