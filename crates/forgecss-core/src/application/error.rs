//! Application layer errors.
//!
//! These errors represent failures at the ports: the filesystem, the command
//! runner and the template renderer. Language errors are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while the engine drives its ports.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// The program is not on the runner's allow-list. Nothing was started.
    #[error("command '{program}' is not allowed (from \"{command}\")")]
    DisallowedCommand { program: String, command: String },

    /// The process could not be started or exited unsuccessfully.
    #[error("command \"{command}\" failed ({}){}", describe_exit(.exit_code), describe_stderr(.stderr))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The process outlived its timeout and was killed.
    #[error("command \"{command}\" timed out after {seconds}s")]
    CommandTimedOut { command: String, seconds: f64 },

    /// `fail` write mode found an existing file.
    #[error("refusing to overwrite existing file {}", .path.display())]
    FileConflict { path: PathBuf },

    /// Filesystem operation failed.
    #[error("filesystem error at {}: {reason}", .path.display())]
    FilesystemError { path: PathBuf, reason: String },

    /// Template rendering failed.
    #[error("rendering template '{template}' failed: {reason}")]
    RenderingFailed { template: String, reason: String },

    /// No template with this name is known to the renderer.
    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },

    /// The cancellation flag was raised between statements.
    #[error("scaffolding cancelled")]
    Cancelled,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_owned(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl ApplicationError {
    pub fn filesystem(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::FilesystemError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::DisallowedCommand { program, .. } => vec![
                format!("Allow it explicitly: forgecss apply <FILE> --allow {program}"),
                "Or add it to engine.allowed_commands in the config file".into(),
            ],
            Self::CommandFailed { .. } => vec![
                "Run the command by hand in the same directory to see its full output".into(),
            ],
            Self::CommandTimedOut { .. } => vec![
                "Raise the limit with '@exec ... timeout <seconds>;'".into(),
                "Or set engine.command_timeout_secs in the config file".into(),
            ],
            Self::FileConflict { path } => vec![
                format!("Remove {} or choose another write mode", path.display()),
                "Use 'mode: \"skip\";' to keep existing files".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::TemplateNotFound { name } => vec![
                format!("Create the template file '{name}' in the templates directory"),
                "Point --templates at the directory holding your templates".into(),
            ],
            Self::RenderingFailed { .. } => vec![
                "Every {{ placeholder }} must match a property declared on the file".into(),
            ],
            Self::Cancelled => vec!["Re-run to continue; completed writes are kept".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DisallowedCommand { .. } | Self::FileConflict { .. } => {
                ErrorCategory::Validation
            }
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::CommandFailed { .. }
            | Self::CommandTimedOut { .. }
            | Self::RenderingFailed { .. }
            | Self::Cancelled => ErrorCategory::Execution,
            Self::FilesystemError { .. } => ErrorCategory::Internal,
        }
    }
}
