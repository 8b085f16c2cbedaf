//! Unified error handling for ForgeCSS Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for ForgeCSS Core operations.
///
/// Parsing, evaluation and every port call funnel into this type, so callers
/// handle one error regardless of which layer failed.
#[derive(Debug, Error, Clone)]
pub enum ForgeError {
    /// Errors from the domain layer (language rule violations).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (ports and orchestration).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl ForgeError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Run 'forgecss config list' to inspect the effective settings".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in ForgeCSS".into(),
                "Re-run with -vvv and include the log when reporting it".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// True when the failure came from the source text rather than the
    /// environment it ran against.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Domain(DomainError::Parse(_)))
    }
}

impl From<crate::domain::ParseError> for ForgeError {
    fn from(err: crate::domain::ParseError) -> Self {
        Self::Domain(DomainError::Parse(err))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Execution,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type ForgeResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_errors_convert_and_are_flagged() {
        let err: ForgeError = crate::domain::parse("a {").unwrap_err().into();
        assert!(err.is_parse_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn categories_follow_the_inner_error() {
        let not_found: ForgeError = DomainError::UndefinedVariable { name: "x".into() }.into();
        assert_eq!(not_found.category(), ErrorCategory::NotFound);

        let conflict: ForgeError = ApplicationError::FileConflict {
            path: PathBuf::from("a.txt"),
        }
        .into();
        assert_eq!(conflict.category(), ErrorCategory::Execution);
    }

    #[test]
    fn messages_are_not_double_prefixed() {
        let err: ForgeError = DomainError::UndefinedMixin { name: "m".into() }.into();
        assert_eq!(err.to_string(), "undefined mixin 'm'");
    }
}
