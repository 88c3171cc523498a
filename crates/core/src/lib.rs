//! Shared primitives for all Rust crates in Quotaguard.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Quotaguard crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
///
/// A quota denial is not an error: it is returned as a regular decision
/// value. These variants cover the cases where no decision could be made.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed policy configuration or a caller violating a policy contract.
    ///
    /// Always fatal; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The event store could not be reached or failed to answer.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Evaluation was aborted before a decision was reached.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the failure is transient from the caller's point of view.
    ///
    /// Configuration and validation failures are programmer errors and will
    /// not resolve on their own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_rejects_empty_json_value() {
        let parsed = serde_json::from_str::<NonEmptyString>("\"\"");
        assert!(parsed.is_err());

        let parsed = serde_json::from_str::<NonEmptyString>("\"news\"");
        assert_eq!(
            parsed.ok().map(String::from),
            Some("news".to_owned())
        );
    }

    #[test]
    fn only_store_failures_are_transient() {
        assert!(AppError::Unavailable("db down".to_owned()).is_transient());
        assert!(AppError::Cancelled("timeout".to_owned()).is_transient());
        assert!(!AppError::Configuration("bad policy".to_owned()).is_transient());
        assert!(!AppError::Validation("bad input".to_owned()).is_transient());
    }

    #[test]
    fn error_messages_carry_category_prefix() {
        let error = AppError::Unavailable("connection refused".to_owned());
        assert_eq!(error.to_string(), "unavailable: connection refused");
    }
}
