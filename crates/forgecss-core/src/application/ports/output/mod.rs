//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the engine needs from external systems.
//! The `forgecss-adapters` crate provides implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;

use crate::domain::Value;
use crate::error::ForgeResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `forgecss_adapters::filesystem::LocalFilesystem` (production)
/// - `forgecss_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths handed to the port are already joined onto the engine's cursor.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Check if path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents. Existing is fine.
    fn ensure_directory(&self, path: &Path) -> ForgeResult<()>;

    /// Read a whole file as UTF-8.
    fn read_text(&self, path: &Path) -> ForgeResult<String>;

    /// Create or truncate a file with the given content.
    fn write_text(&self, path: &Path, content: &str) -> ForgeResult<()>;

    /// Directory relative paths are resolved against when no root is given.
    fn current_directory(&self) -> ForgeResult<PathBuf>;
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was ended by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Port for running external programs.
///
/// Implemented by:
/// - `forgecss_adapters::command::ProcessRunner` (production)
/// - `forgecss_adapters::command::RecordingRunner` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` (the leading token of a command) may run.
    fn is_allowed(&self, program: &str) -> bool;

    /// Run a command line synchronously.
    ///
    /// A timeout that elapses yields `ApplicationError::CommandTimedOut`.
    /// A nonzero exit is reported through [`CommandOutput::status`], not as
    /// an error.
    fn run(
        &self,
        command: &str,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> ForgeResult<CommandOutput>;
}

/// Port for template rendering.
///
/// Implemented by:
/// - `forgecss_adapters::renderer::SimpleRenderer` (in-memory templates)
/// - `forgecss_adapters::renderer::DirectoryRenderer` (templates on disk)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render the named template against a file's model.
    fn render(&self, name: &str, model: &IndexMap<String, Value>) -> ForgeResult<String>;
}
