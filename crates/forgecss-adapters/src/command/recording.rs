//! Scripted command runner for tests.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use forgecss_core::{
    application::{CommandOutput, ports::CommandRunner},
    error::ForgeResult,
};

use super::DEFAULT_ALLOWED_COMMANDS;

/// One call to [`CommandRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
}

/// Records every run instead of starting processes.
///
/// Clones share the same log. Outputs can be scripted per command line;
/// anything unscripted succeeds with empty output.
#[derive(Debug, Clone)]
pub struct RecordingRunner {
    allowed: BTreeSet<String>,
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    invocations: Vec<Invocation>,
    scripted: HashMap<String, ForgeResult<CommandOutput>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::with_allowed(DEFAULT_ALLOWED_COMMANDS.iter().copied())
    }

    pub fn with_allowed<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: programs
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            inner: Arc::default(),
        }
    }

    /// Return `result` whenever exactly `command` runs.
    pub fn script(&self, command: impl Into<String>, result: ForgeResult<CommandOutput>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripted.insert(command.into(), result);
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.inner
            .lock()
            .map(|inner| inner.invocations.clone())
            .unwrap_or_default()
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for RecordingRunner {
    fn is_allowed(&self, program: &str) -> bool {
        self.allowed.contains(&program.to_lowercase())
    }

    fn run(
        &self,
        command: &str,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> ForgeResult<CommandOutput> {
        let mut inner = self.inner.lock().map_err(|_| forgecss_core::error::ForgeError::Internal {
            message: "recording runner lock poisoned".into(),
        })?;
        inner.invocations.push(Invocation {
            command: command.to_owned(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        });
        inner
            .scripted
            .get(command)
            .cloned()
            .unwrap_or_else(|| Ok(CommandOutput::success()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_replays_scripts() {
        let runner = RecordingRunner::new();
        runner.script(
            "git status",
            Ok(CommandOutput {
                status: Some(1),
                ..CommandOutput::default()
            }),
        );

        let log = runner.clone();
        assert_eq!(
            runner.run("git status", Path::new("/w"), None).unwrap().status,
            Some(1)
        );
        assert!(runner.run("git init", Path::new("/w"), None).unwrap().is_success());
        assert_eq!(log.invocations().len(), 2);
        assert_eq!(log.invocations()[0].working_dir, PathBuf::from("/w"));
    }
}
