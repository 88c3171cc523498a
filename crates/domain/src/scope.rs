//! Communities an action targets and how policies aggregate over them.

use std::fmt::{Display, Formatter};

use quotaguard_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Name of a community an action targets.
///
/// Names are compared case-insensitively by event stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeName(NonEmptyString);

impl ScopeName {
    /// Creates a validated scope name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ScopeName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The resource an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Site-wide action with no community.
    Global,
    /// Action inside a named community.
    Community(ScopeName),
}

impl Scope {
    /// Creates a community scope from a raw name.
    pub fn community(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Community(ScopeName::new(name)?))
    }

    /// Returns the community name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&ScopeName> {
        match self {
            Self::Global => None,
            Self::Community(name) => Some(name),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => formatter.write_str("global"),
            Self::Community(name) => write!(formatter, "community '{name}'"),
        }
    }
}

/// Whether a policy counts events per community or across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Aggregate across every scope.
    Global,
    /// Restrict counting to the scope of the evaluated action.
    PerScope,
}
