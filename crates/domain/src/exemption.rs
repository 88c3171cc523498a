//! Composable predicates that exempt a subject from a quota policy.
//!
//! Exemptions are evaluated against the same instant the quota window is
//! anchored to, so an account that crosses an age boundary mid-request is
//! judged consistently across every policy in one evaluation.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::Subject;

/// Accounts older than this many whole days are considered established.
pub const ESTABLISHED_ACCOUNT_MIN_AGE_DAYS: i64 = 30;

/// Accounts with at least this many submission points are considered established.
pub const ESTABLISHED_ACCOUNT_MIN_SUBMISSION_POINTS: i64 = 50;

/// Predicate deciding whether a subject is exempt from a policy.
pub trait ExemptionRule: Debug + Send + Sync {
    /// Returns `true` when the policy must be skipped for `subject`.
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool;
}

/// Shared, cheaply clonable exemption predicate.
#[derive(Clone)]
pub struct Exemption(Arc<dyn ExemptionRule>);

impl Exemption {
    /// Wraps a custom exemption rule.
    #[must_use]
    pub fn new(rule: impl ExemptionRule + 'static) -> Self {
        Self(Arc::new(rule))
    }

    /// Wraps a closure as an exemption rule. `label` is used for debug output.
    #[must_use]
    pub fn from_fn<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Subject, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        Self::new(FnRule {
            label: label.into(),
            predicate: Box::new(predicate),
        })
    }

    /// Exempts accounts strictly older than `days` whole days.
    #[must_use]
    pub fn account_older_than_days(days: i64) -> Self {
        Self::new(AccountOlderThan { days })
    }

    /// Exempts subjects with at least `points` submission points.
    #[must_use]
    pub fn submission_points_at_least(points: i64) -> Self {
        Self::new(SubmissionPointsAtLeast { points })
    }

    /// Exempts subjects with at least `points` comment points.
    #[must_use]
    pub fn comment_points_at_least(points: i64) -> Self {
        Self::new(CommentPointsAtLeast { points })
    }

    /// Standard exemption for trusted accounts: older than 30 days or at
    /// least 50 submission points.
    #[must_use]
    pub fn established_account() -> Self {
        Self::account_older_than_days(ESTABLISHED_ACCOUNT_MIN_AGE_DAYS).or(
            Self::submission_points_at_least(ESTABLISHED_ACCOUNT_MIN_SUBMISSION_POINTS),
        )
    }

    /// Exempts when either predicate exempts.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::new(AnyOf(vec![self, other]))
    }

    /// Exempts only when both predicates exempt.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::new(AllOf(vec![self, other]))
    }

    /// Inverts the predicate.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::new(Not(self))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        self.0.exempts(subject, as_of)
    }
}

impl Debug for Exemption {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

#[derive(Debug)]
struct AccountOlderThan {
    days: i64,
}

impl ExemptionRule for AccountOlderThan {
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        subject.account_age_days(as_of) > self.days
    }
}

#[derive(Debug)]
struct SubmissionPointsAtLeast {
    points: i64,
}

impl ExemptionRule for SubmissionPointsAtLeast {
    fn exempts(&self, subject: &Subject, _as_of: DateTime<Utc>) -> bool {
        subject.submission_points() >= self.points
    }
}

#[derive(Debug)]
struct CommentPointsAtLeast {
    points: i64,
}

impl ExemptionRule for CommentPointsAtLeast {
    fn exempts(&self, subject: &Subject, _as_of: DateTime<Utc>) -> bool {
        subject.comment_points() >= self.points
    }
}

#[derive(Debug)]
struct AnyOf(Vec<Exemption>);

impl ExemptionRule for AnyOf {
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        self.0.iter().any(|rule| rule.exempts(subject, as_of))
    }
}

#[derive(Debug)]
struct AllOf(Vec<Exemption>);

impl ExemptionRule for AllOf {
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        self.0.iter().all(|rule| rule.exempts(subject, as_of))
    }
}

#[derive(Debug)]
struct Not(Exemption);

impl ExemptionRule for Not {
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        !self.0.exempts(subject, as_of)
    }
}

type Predicate = Box<dyn Fn(&Subject, DateTime<Utc>) -> bool + Send + Sync>;

struct FnRule {
    label: String,
    predicate: Predicate,
}

impl Debug for FnRule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FnRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ExemptionRule for FnRule {
    fn exempts(&self, subject: &Subject, as_of: DateTime<Utc>) -> bool {
        (self.predicate)(subject, as_of)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use super::Exemption;
    use crate::{Subject, SubjectId};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    fn subject_registered_days_ago(days: i64) -> Subject {
        Subject::new(
            SubjectId::new("alice").unwrap_or_else(|_| unreachable!()),
            as_of() - Duration::days(days),
        )
    }

    #[test]
    fn established_account_exempts_old_accounts() {
        let exemption = Exemption::established_account();

        assert!(exemption.exempts(&subject_registered_days_ago(45), as_of()));
        assert!(exemption.exempts(&subject_registered_days_ago(31), as_of()));
        assert!(!exemption.exempts(&subject_registered_days_ago(30), as_of()));
    }

    #[test]
    fn established_account_exempts_high_scoring_new_accounts() {
        let exemption = Exemption::established_account();

        let at_boundary = subject_registered_days_ago(2).with_submission_points(50);
        let below_boundary = subject_registered_days_ago(2).with_submission_points(49);

        assert!(exemption.exempts(&at_boundary, as_of()));
        assert!(!exemption.exempts(&below_boundary, as_of()));
    }

    #[test]
    fn combinators_compose() {
        let negative_comment_score = Exemption::comment_points_at_least(0);
        let subject = subject_registered_days_ago(1).with_comment_points(-3);

        assert!(!negative_comment_score.exempts(&subject, as_of()));
        assert!(negative_comment_score.clone().negate().exempts(&subject, as_of()));

        let both = negative_comment_score.and(Exemption::account_older_than_days(0));
        assert!(!both.exempts(&subject, as_of()));
    }

    #[test]
    fn closures_can_be_used_as_exemptions() {
        let moderators = Exemption::from_fn("moderators", |subject, _| {
            subject.id().as_str().eq_ignore_ascii_case("mod")
        });

        let moderator = Subject::new(
            SubjectId::new("MOD").unwrap_or_else(|_| unreachable!()),
            as_of(),
        );
        assert!(moderators.exempts(&moderator, as_of()));
        assert!(!moderators.exempts(&subject_registered_days_ago(1), as_of()));
        assert!(format!("{moderators:?}").contains("moderators"));
    }

    proptest! {
        #[test]
        fn account_age_exemption_matches_whole_day_comparison(
            age_seconds in 0_i64..(120 * 86_400),
            threshold_days in 0_i64..90,
        ) {
            let subject = Subject::new(
                SubjectId::new("alice").unwrap_or_else(|_| unreachable!()),
                as_of() - Duration::seconds(age_seconds),
            );
            let exemption = Exemption::account_older_than_days(threshold_days);

            prop_assert_eq!(
                exemption.exempts(&subject, as_of()),
                age_seconds / 86_400 > threshold_days
            );
        }
    }
}
