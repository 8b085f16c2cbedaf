// ============================================================================
// domain/error.rs - LANGUAGE ERROR DOMAIN
// ============================================================================

use thiserror::Error;

pub use crate::domain::parser::ParseError;

/// Root domain error type.
///
/// Everything that can go wrong while parsing or evaluating a program
/// without touching the outside world. All errors are:
/// - Cloneable (reports keep a copy)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Syntax
    // ========================================================================
    #[error(transparent)]
    Parse(#[from] ParseError),

    // ========================================================================
    // Resolution
    // ========================================================================
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("undefined mixin '{name}'")]
    UndefinedMixin { name: String },

    #[error("mixin '{mixin}' expects {expected} argument(s) but got {found}")]
    ArityMismatch {
        mixin: String,
        expected: usize,
        found: usize,
    },

    // ========================================================================
    // Evaluation
    // ========================================================================
    #[error("type error in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("mixin '{mixin}' nested more than {limit} includes deep")]
    IncludeDepthExceeded { mixin: String, limit: usize },

    #[error("invalid write mode '{mode}'")]
    InvalidWriteMode { mode: String },

    #[error("invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("path climbs out of the scaffold root: {path}")]
    PathEscapesRoot { path: String },

    // ========================================================================
    // File rules
    // ========================================================================
    #[error("file '{path}' declares neither 'template' nor 'content'")]
    MissingFileContent { path: String },

    #[error("file '{path}' declares both 'template' and 'content'")]
    ConflictingFileContent { path: String },

    #[error("file '{path}' declares '{key}' more than once")]
    DuplicateFileProperty { path: String, key: String },

    #[error("rules cannot be nested inside file '{path}'")]
    NestedRuleInFile { path: String },

    // ========================================================================
    // Invariant violations
    // ========================================================================
    #[error("scope stack underflow: attempted to pop the root frame")]
    ScopeUnderflow,
}

impl DomainError {
    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Parse(e) => vec![
                format!("Check the source near line {}, column {}", e.line, e.column),
                "Run 'forgecss check <FILE>' to validate syntax without applying".into(),
            ],
            Self::UndefinedVariable { name } => vec![
                format!("Declare it before use: {name}: \"...\";"),
                "Variables declared inside :root, @foreach or a mixin are not visible outside it"
                    .into(),
            ],
            Self::UndefinedMixin { name } => vec![
                format!("Declare it first: @mixin {name}(...) {{ ... }}"),
                "Mixins are only visible in the block that declares them and blocks nested in it"
                    .into(),
            ],
            Self::ArityMismatch {
                mixin, expected, ..
            } => vec![format!(
                "Call it with exactly {expected} argument(s): @include {mixin}(...);"
            )],
            Self::IncludeDepthExceeded { mixin, .. } => vec![
                format!("Check '{mixin}' for an @include that reaches itself"),
            ],
            Self::InvalidWriteMode { .. } => vec![
                "Supported modes: overwrite-if-changed, skip, fail".into(),
            ],
            Self::MissingFileContent { .. } => vec![
                "Add 'content: \"...\";' for literal text".into(),
                "Or add 'template: \"name\";' to render a template".into(),
            ],
            Self::ConflictingFileContent { .. } => vec![
                "Keep only one of 'template' or 'content'".into(),
            ],
            Self::NestedRuleInFile { .. } => vec![
                "Directories end with '/': move nested rules into a directory rule".into(),
            ],
            Self::PathEscapesRoot { .. } => vec![
                "'..' may only step back into directories below the root".into(),
                "Pass --root to scaffold somewhere else".into(),
            ],
            Self::ScopeUnderflow => vec![
                "This appears to be a bug in ForgeCSS, please report it".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UndefinedVariable { .. } | Self::UndefinedMixin { .. } => {
                ErrorCategory::NotFound
            }
            Self::ScopeUnderflow => ErrorCategory::Internal,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}
