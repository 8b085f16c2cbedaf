//! What a run did, in the order it did it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One observable effect of a run (or, under dry-run, of the run that
/// would have happened).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    DirectoryCreated { path: PathBuf },
    DirectoryExists { path: PathBuf },
    FileCreated { path: PathBuf },
    FileModified { path: PathBuf },
    FileUnchanged { path: PathBuf },
    FileSkipped { path: PathBuf },
    CommandExecuted { command: String, working_dir: PathBuf },
}

impl Action {
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryCreated { path }
            | Self::DirectoryExists { path }
            | Self::FileCreated { path }
            | Self::FileModified { path }
            | Self::FileUnchanged { path }
            | Self::FileSkipped { path } => path,
            Self::CommandExecuted { working_dir, .. } => working_dir,
        }
    }

    /// Whether this action mutates the target tree.
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreated { .. } | Self::FileCreated { .. } | Self::FileModified { .. }
        )
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::DirectoryCreated { .. } => "create dir",
            Self::DirectoryExists { .. } => "exists",
            Self::FileCreated { .. } => "create",
            Self::FileModified { .. } => "update",
            Self::FileUnchanged { .. } => "unchanged",
            Self::FileSkipped { .. } => "skipped (exists)",
            Self::CommandExecuted { .. } => "exec",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandExecuted {
                command,
                working_dir,
            } => write!(f, "{:>16}  {command} (in {})", self.label(), working_dir.display()),
            other => write!(f, "{:>16}  {}", other.label(), other.path().display()),
        }
    }
}

/// Ordered list of actions plus whether they were only simulated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaffoldReport {
    pub dry_run: bool,
    pub actions: Vec<Action>,
}

impl ScaffoldReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            actions: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Directory creations and file writes, performed or simulated.
    pub fn writes(&self) -> usize {
        self.actions.iter().filter(|a| a.is_write()).count()
    }

    pub fn commands(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::CommandExecuted { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
