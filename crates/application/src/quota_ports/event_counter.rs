use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quotaguard_core::AppResult;
use quotaguard_domain::{ActionKind, ActivityEvent, ScopeName, SubjectId};

/// Filters for one count of historical events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCountQuery {
    /// Counted action kind.
    pub action_kind: ActionKind,
    /// Acting subject, matched case-insensitively.
    pub subject_id: SubjectId,
    /// Inclusive window start.
    pub from: DateTime<Utc>,
    /// Inclusive window end.
    pub to: DateTime<Utc>,
    /// Community filter, matched case-insensitively. `None` counts every scope.
    pub scope: Option<ScopeName>,
    /// Content filter, matched case-insensitively. `None` counts any content.
    pub content_equals: Option<String>,
}

impl EventCountQuery {
    /// Returns whether a stored event is counted by this query.
    #[must_use]
    pub fn matches(&self, event: &ActivityEvent) -> bool {
        if event.action_kind() != self.action_kind {
            return false;
        }

        if !eq_ignore_case(event.subject_id().as_str(), self.subject_id.as_str()) {
            return false;
        }

        let occurred_at = event.occurred_at();
        if occurred_at < self.from || occurred_at > self.to {
            return false;
        }

        if let Some(scope) = &self.scope {
            let in_scope = event
                .scope()
                .name()
                .is_some_and(|name| eq_ignore_case(name.as_str(), scope.as_str()));
            if !in_scope {
                return false;
            }
        }

        if let Some(content) = &self.content_equals {
            let same_content = event
                .content()
                .is_some_and(|value| eq_ignore_case(value, content));
            if !same_content {
                return false;
            }
        }

        true
    }
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

/// Port counting stored events that match a query.
///
/// Counts must be a pure function of the query for a consistent snapshot of
/// stored events. Failures to reach the store are reported as
/// `AppError::Unavailable` and are never retried by callers of this port.
#[async_trait]
pub trait EventCounter: Send + Sync {
    /// Counts events matching `query`.
    async fn count(&self, query: &EventCountQuery) -> AppResult<u64>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use quotaguard_domain::{ActionKind, ActivityEvent, Scope, ScopeName, SubjectId};

    use super::EventCountQuery;

    fn subject(value: &str) -> SubjectId {
        SubjectId::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn query() -> EventCountQuery {
        let to = Utc
            .with_ymd_and_hms(2026, 5, 10, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        EventCountQuery {
            action_kind: ActionKind::Submission,
            subject_id: subject("Alice"),
            from: to - Duration::hours(24),
            to,
            scope: Some(ScopeName::new("News").unwrap_or_else(|_| unreachable!())),
            content_equals: Some("https://example.com/Story".to_owned()),
        }
    }

    fn event(scope: &str, content: &str, offset: Duration) -> ActivityEvent {
        ActivityEvent::new(
            ActionKind::Submission,
            subject("alice"),
            Scope::community(scope).unwrap_or_else(|_| unreachable!()),
            Some(content.to_owned()),
            query().to - offset,
        )
    }

    #[test]
    fn matches_case_insensitively() {
        let query = query();
        assert!(query.matches(&event("news", "HTTPS://EXAMPLE.COM/story", Duration::hours(1))));
        assert!(!query.matches(&event("politics", "https://example.com/story", Duration::hours(1))));
        assert!(!query.matches(&event("news", "https://example.com/other", Duration::hours(1))));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let query = query();
        assert!(query.matches(&event("news", "https://example.com/story", Duration::zero())));
        assert!(query.matches(&event("news", "https://example.com/story", Duration::hours(24))));
        assert!(!query.matches(&event(
            "news",
            "https://example.com/story",
            Duration::hours(24) + Duration::seconds(1)
        )));
    }

    #[test]
    fn scope_filter_excludes_global_events() {
        let query = query();
        let global = ActivityEvent::new(
            ActionKind::Submission,
            subject("alice"),
            Scope::Global,
            Some("https://example.com/story".to_owned()),
            query.to,
        );
        assert!(!query.matches(&global));

        let unscoped = EventCountQuery {
            scope: None,
            ..query
        };
        assert!(unscoped.matches(&global));
    }
}
