//! Process runner backed by `std::process`.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use forgecss_core::{
    application::{ApplicationError, CommandOutput, ports::CommandRunner},
    domain::command::split_command,
    error::ForgeResult,
};
use tracing::{debug, instrument, warn};

/// Programs allowed when no explicit list is configured.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["dotnet", "git"];

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs allow-listed programs directly, without a shell.
///
/// Program names are compared case-insensitively against the allow-list.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    allowed: BTreeSet<String>,
}

impl ProcessRunner {
    /// Runner allowing [`DEFAULT_ALLOWED_COMMANDS`].
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
        }
    }

    /// Add one more program to the allow-list.
    pub fn allow(mut self, program: impl AsRef<str>) -> Self {
        self.allowed.insert(program.as_ref().to_lowercase());
        self
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ProcessRunner {
    fn is_allowed(&self, program: &str) -> bool {
        self.allowed.contains(&program.to_lowercase())
    }

    #[instrument(skip_all, fields(command = %command, dir = %working_dir.display()))]
    fn run(
        &self,
        command: &str,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> ForgeResult<CommandOutput> {
        let words = split_command(command)?;
        let (program, args) = words.split_first().ok_or_else(|| failed(command, "empty command"))?;
        if !self.is_allowed(program) {
            return Err(ApplicationError::DisallowedCommand {
                program: program.clone(),
                command: command.to_owned(),
            }
            .into());
        }

        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(command, format!("could not start '{program}': {e}")))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait(&mut child, timeout).map_err(|e| failed(command, e))?;
        let Some(status) = status else {
            warn!(?timeout, "Command timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ApplicationError::CommandTimedOut {
                command: command.to_owned(),
                seconds: timeout.map_or(0.0, |t| t.as_secs_f64()),
            }
            .into());
        };

        let output = CommandOutput {
            status: status.code(),
            stdout: join(stdout),
            stderr: join(stderr),
        };
        debug!(status = ?output.status, "Command finished");
        Ok(output)
    }
}

/// Wait for the child, or return `None` once `timeout` has elapsed.
///
/// A timeout too large to add to the clock means no deadline.
fn wait(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(deadline) = timeout.and_then(|t| Instant::now().checked_add(t)) else {
        return child.wait().map(Some);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// Pipes are read on their own threads so a chatty child cannot block on a
// full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                warn!(error = %e, bytes = buf.len(), "Reading command output failed, keeping partial output");
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn failed(command: &str, reason: impl ToString) -> forgecss_core::error::ForgeError {
    ApplicationError::CommandFailed {
        command: command.to_owned(),
        exit_code: None,
        stderr: reason.to_string(),
    }
    .into()
}
