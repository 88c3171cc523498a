//! Recorded user activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActionKind, Scope, SubjectId};

/// One recorded user action, as stored by activity logs and counted by quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    action_kind: ActionKind,
    subject_id: SubjectId,
    scope: Scope,
    content: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Creates an activity event.
    #[must_use]
    pub fn new(
        action_kind: ActionKind,
        subject_id: SubjectId,
        scope: Scope,
        content: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action_kind,
            subject_id,
            scope,
            content,
            occurred_at,
        }
    }

    /// Returns the action kind.
    #[must_use]
    pub fn action_kind(&self) -> ActionKind {
        self.action_kind
    }

    /// Returns the acting subject.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the targeted scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the content key, such as a submitted link.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Returns when the action happened.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
