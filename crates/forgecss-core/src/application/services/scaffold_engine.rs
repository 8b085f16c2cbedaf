//! Scaffold Engine - main application orchestrator.
//!
//! The engine walks a parsed [`Stylesheet`] in document order and turns it
//! into port calls:
//! 1. Directory rules ensure directories and move the cursor
//! 2. File rules collect properties, render or evaluate content, and apply
//!    the write policy
//! 3. `@exec` runs allow-listed commands
//!
//! Running two engines against the same target tree at the same time is not
//! supported; nothing here locks the tree.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{CommandRunner, Filesystem, TemplateRenderer},
        services::report::{Action, ScaffoldReport},
    },
    domain::{
        DomainError, ExecRule, FileContext, FileSource, ForeachRule, MixinInclude, PathSegment,
        Rule, ScopeStack, Selector, Statement, Stylesheet, Value, WriteMode,
        command::program_token,
        eval::{evaluate, evaluate_text},
    },
    error::{ForgeError, ForgeResult},
};

/// Includes deeper than this are treated as runaway recursion.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Knobs for a single engine.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Log and report every mutation without performing it.
    pub dry_run: bool,
    /// Write mode for files that do not declare `mode`.
    pub default_mode: WriteMode,
    /// Directory relative selectors start from. Defaults to the
    /// filesystem port's current directory; relative roots are joined to it.
    pub root: Option<PathBuf>,
    /// Timeout for `@exec` rules that do not declare one.
    pub command_timeout: Option<Duration>,
    /// Raised by another thread to stop between statements.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl EngineOptions {
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn default_mode(mut self, mode: WriteMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }
}

/// Evaluates stylesheets against the injected ports.
pub struct ScaffoldEngine {
    filesystem: Box<dyn Filesystem>,
    runner: Box<dyn CommandRunner>,
    renderer: Box<dyn TemplateRenderer>,
    options: EngineOptions,
}

impl ScaffoldEngine {
    /// Create a new engine with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use forgecss_core::application::{EngineOptions, ScaffoldEngine};
    ///
    /// let engine = ScaffoldEngine::new(
    ///     filesystem, // impl Filesystem
    ///     runner,     // impl CommandRunner
    ///     renderer,   // impl TemplateRenderer
    ///     EngineOptions::default().dry_run(true),
    /// );
    /// ```
    pub fn new(
        filesystem: Box<dyn Filesystem>,
        runner: Box<dyn CommandRunner>,
        renderer: Box<dyn TemplateRenderer>,
        options: EngineOptions,
    ) -> Self {
        Self {
            filesystem,
            runner,
            renderer,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Execute every statement of `sheet` in order.
    ///
    /// The first error aborts the run. Writes made before it are kept.
    #[instrument(
        skip_all,
        fields(statements = sheet.len(), dry_run = self.options.dry_run)
    )]
    pub fn run(&self, sheet: &Stylesheet) -> ForgeResult<ScaffoldReport> {
        let mut execution = Execution::new(self)?;
        info!(root = %execution.cwd.display(), "Applying stylesheet");

        execution.execute_block(&sheet.statements)?;

        let report = execution.report;
        info!(
            actions = report.actions.len(),
            writes = report.writes(),
            "Scaffold completed successfully"
        );
        Ok(report)
    }

    fn initial_directory(&self) -> ForgeResult<PathBuf> {
        match &self.options.root {
            Some(root) if root.is_absolute() => Ok(root.clone()),
            Some(root) => Ok(self.filesystem.current_directory()?.join(root)),
            None => self.filesystem.current_directory(),
        }
    }
}

// -------------------------------------------------------------------------
// Per-run state
// -------------------------------------------------------------------------

/// Mutable state of one run. Lives only for the duration of `run`.
struct Execution<'e> {
    engine: &'e ScaffoldEngine,
    scopes: ScopeStack,
    /// Every resolved selector stays below this directory.
    root: PathBuf,
    cwd: PathBuf,
    directories: Vec<PathBuf>,
    file: Option<FileContext>,
    include_depth: usize,
    report: ScaffoldReport,
}

impl<'e> Execution<'e> {
    fn new(engine: &'e ScaffoldEngine) -> ForgeResult<Self> {
        let root = engine.initial_directory()?;
        Ok(Self {
            cwd: root.clone(),
            root,
            engine,
            scopes: ScopeStack::new(),
            directories: Vec::new(),
            file: None,
            include_depth: 0,
            report: ScaffoldReport::new(engine.options.dry_run),
        })
    }

    fn dry_run(&self) -> bool {
        self.engine.options.dry_run
    }

    fn execute_block(&mut self, statements: &[Statement]) -> ForgeResult<()> {
        for statement in statements {
            self.check_cancelled()?;
            self.execute(statement)?;
        }
        Ok(())
    }

    fn check_cancelled(&self) -> ForgeResult<()> {
        match &self.engine.options.cancel_flag {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ApplicationError::Cancelled.into()),
            _ => Ok(()),
        }
    }

    fn execute(&mut self, statement: &Statement) -> ForgeResult<()> {
        debug!(kind = statement.keyword(), "Executing statement");
        match statement {
            Statement::Root(root) => self.scoped(|ex| ex.execute_block(&root.body)),
            Statement::Declaration(decl) => {
                let value = evaluate(&decl.value, &self.scopes)?;
                match self.file.as_mut() {
                    Some(context) => context.record(&decl.name, value)?,
                    None => self.scopes.set_variable(decl.name.clone(), value),
                }
                Ok(())
            }
            Statement::Rule(rule) => {
                if let Some(context) = &self.file {
                    return Err(DomainError::NestedRuleInFile {
                        path: context.path().display().to_string(),
                    }
                    .into());
                }
                match rule.selector {
                    Selector::Path(_) => self.directory_rule(rule),
                    Selector::File(_) => self.file_rule(rule),
                }
            }
            Statement::If(rule) => {
                if evaluate(&rule.condition, &self.scopes)?.is_truthy() {
                    self.execute_block(&rule.then_branch)
                } else if let Some(else_branch) = &rule.else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(())
                }
            }
            Statement::Foreach(rule) => self.foreach_rule(rule),
            Statement::Exec(rule) => self.exec_rule(rule),
            Statement::Mixin(decl) => {
                debug!(mixin = %decl.name, "Declaring mixin");
                self.scopes.define_mixin(decl.clone());
                Ok(())
            }
            Statement::Include(include) => self.include(include),
        }
    }

    /// Run `body` in a fresh child scope, popping it on every path.
    fn scoped<T>(&mut self, body: impl FnOnce(&mut Self) -> ForgeResult<T>) -> ForgeResult<T> {
        self.scopes.push();
        let outcome = body(self);
        let popped = self.scopes.pop();
        let value = outcome?;
        popped?;
        Ok(value)
    }

    // ── Directories and files ───────────────────────────────────────────────

    fn directory_rule(&mut self, rule: &Rule) -> ForgeResult<()> {
        let target = self.resolve_selector(&rule.selector)?;
        let fs = &self.engine.filesystem;

        if fs.exists(&target) {
            debug!(path = %target.display(), "Directory exists");
            self.report.record(Action::DirectoryExists {
                path: target.clone(),
            });
        } else {
            if self.dry_run() {
                info!(path = %target.display(), "dry-run: would create directory");
            } else {
                fs.ensure_directory(&target)?;
                info!(path = %target.display(), "Created directory");
            }
            self.report.record(Action::DirectoryCreated {
                path: target.clone(),
            });
        }

        self.directories
            .push(std::mem::replace(&mut self.cwd, target));
        let outcome = self.execute_block(&rule.body);
        if let Some(previous) = self.directories.pop() {
            self.cwd = previous;
        }
        outcome
    }

    fn file_rule(&mut self, rule: &Rule) -> ForgeResult<()> {
        let target = self.resolve_selector(&rule.selector)?;
        let parent = target
            .parent()
            .map_or_else(|| self.cwd.clone(), Path::to_path_buf);

        let saved = std::mem::replace(&mut self.cwd, parent);
        self.file = Some(FileContext::new(&target));
        let outcome = self.execute_block(&rule.body);
        self.cwd = saved;
        let context = self.file.take();
        outcome?;

        let context = context.ok_or_else(|| ForgeError::Internal {
            message: format!("file context for {} was lost", target.display()),
        })?;
        let mode = context.mode().unwrap_or(self.engine.options.default_mode);

        let content = match context.into_source()? {
            FileSource::Template { name, model } => {
                debug!(template = %name, "Rendering template");
                self.engine.renderer.render(&name, &model)?
            }
            FileSource::Content(value) => value.to_text(),
        };
        self.write_file(&target, &content, mode)
    }

    fn write_file(&mut self, path: &Path, content: &str, mode: WriteMode) -> ForgeResult<()> {
        let fs = &self.engine.filesystem;
        let exists = fs.exists(path);

        if exists {
            match mode {
                WriteMode::Skip => {
                    info!(path = %path.display(), "Skipped (exists)");
                    self.report.record(Action::FileSkipped {
                        path: path.to_path_buf(),
                    });
                    return Ok(());
                }
                WriteMode::Fail => {
                    return Err(ApplicationError::FileConflict {
                        path: path.to_path_buf(),
                    }
                    .into());
                }
                WriteMode::OverwriteIfChanged => {
                    if fs.read_text(path)? == content {
                        debug!(path = %path.display(), "Unchanged");
                        self.report.record(Action::FileUnchanged {
                            path: path.to_path_buf(),
                        });
                        return Ok(());
                    }
                }
            }
        }

        if self.dry_run() {
            info!(path = %path.display(), bytes = content.len(), "dry-run: would write file");
        } else {
            if let Some(parent) = path.parent() {
                fs.ensure_directory(parent)?;
            }
            fs.write_text(path, content)?;
            info!(path = %path.display(), bytes = content.len(), "Wrote file");
        }

        let path = path.to_path_buf();
        self.report.record(if exists {
            Action::FileModified { path }
        } else {
            Action::FileCreated { path }
        });
        Ok(())
    }

    /// Concatenate the selector's pieces and join the result onto the cursor.
    fn resolve_selector(&self, selector: &Selector) -> ForgeResult<PathBuf> {
        let mut text = String::new();
        for segment in selector.segments() {
            match segment {
                PathSegment::Literal(literal) => text.push_str(literal),
                PathSegment::Interpolated(expr) => {
                    text.push_str(&evaluate_text(expr, &self.scopes)?)
                }
            }
        }

        let mut resolved = self.cwd.clone();
        for component in Path::new(&text).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() || !resolved.starts_with(&self.root) {
                        return Err(DomainError::PathEscapesRoot { path: text }.into());
                    }
                }
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(DomainError::AbsolutePathNotAllowed { path: text }.into());
                }
            }
        }
        Ok(resolved)
    }

    // ── Control flow ────────────────────────────────────────────────────────

    fn foreach_rule(&mut self, rule: &ForeachRule) -> ForgeResult<()> {
        let items = match evaluate(&rule.sequence, &self.scopes)? {
            Value::Array(items) => items,
            other => {
                return Err(DomainError::type_mismatch(
                    format!("@foreach ${}", rule.variable),
                    "array",
                    other.type_name(),
                )
                .into());
            }
        };

        debug!(variable = %rule.variable, items = items.len(), "Iterating");
        for item in items {
            self.scoped(|ex| {
                ex.scopes.set_variable(rule.variable.clone(), item);
                ex.execute_block(&rule.body)
            })?;
        }
        Ok(())
    }

    fn include(&mut self, include: &MixinInclude) -> ForgeResult<()> {
        let mixin = self.scopes.resolve_mixin(&include.name)?;
        let arguments = include
            .arguments
            .iter()
            .map(|argument| evaluate(argument, &self.scopes))
            .collect::<Result<Vec<_>, _>>()?;

        let expected = mixin.decl.parameters.len();
        if arguments.len() != expected {
            return Err(DomainError::ArityMismatch {
                mixin: include.name.clone(),
                expected,
                found: arguments.len(),
            }
            .into());
        }
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(DomainError::IncludeDepthExceeded {
                mixin: include.name.clone(),
                limit: MAX_INCLUDE_DEPTH,
            }
            .into());
        }

        debug!(mixin = %include.name, "Including mixin");
        let caller = self.scopes.enter(&mixin.scope);
        for (parameter, argument) in mixin.decl.parameters.iter().zip(arguments) {
            self.scopes.set_variable(parameter.clone(), argument);
        }
        self.include_depth += 1;
        let outcome = self.execute_block(&mixin.decl.body);
        self.include_depth -= 1;
        self.scopes.leave(caller);
        outcome
    }

    // ── Commands ────────────────────────────────────────────────────────────

    fn exec_rule(&mut self, rule: &ExecRule) -> ForgeResult<()> {
        let command = evaluate_text(&rule.command, &self.scopes)?;
        let program = program_token(&command)?;

        let working_dir = match &rule.working_directory {
            Some(expr) => self.cwd.join(evaluate_text(expr, &self.scopes)?),
            None => self.cwd.clone(),
        };
        let timeout = match &rule.timeout {
            Some(expr) => Some(self.timeout(expr)?),
            None => self.engine.options.command_timeout,
        };

        let runner = &self.engine.runner;
        if !runner.is_allowed(&program) {
            warn!(%program, %command, "Command not on the allow-list");
            return Err(ApplicationError::DisallowedCommand { program, command }.into());
        }

        if self.dry_run() {
            info!(%command, dir = %working_dir.display(), "dry-run: would execute");
        } else {
            info!(%command, dir = %working_dir.display(), "Executing");
            let output = runner.run(&command, &working_dir, timeout)?;
            if !output.stdout.is_empty() {
                debug!(stdout = %output.stdout.trim_end(), "Command output");
            }
            if !output.is_success() {
                return Err(ApplicationError::CommandFailed {
                    command,
                    exit_code: output.status,
                    stderr: output.stderr,
                }
                .into());
            }
        }

        self.report.record(Action::CommandExecuted {
            command,
            working_dir,
        });
        Ok(())
    }

    fn timeout(&self, expr: &crate::domain::Expr) -> ForgeResult<Duration> {
        let value = evaluate(expr, &self.scopes)?;
        // Rejects negative, NaN and values too large for a Duration.
        match value
            .as_number()
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        {
            Some(timeout) => Ok(timeout),
            None => Err(DomainError::type_mismatch(
                "@exec timeout",
                "non-negative number of seconds",
                value.type_name(),
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CommandOutput, MockCommandRunner, MockFilesystem, MockTemplateRenderer,
    };
    use crate::domain::parse;

    const ROOT: &str = "/work";

    fn filesystem() -> MockFilesystem {
        let mut fs = MockFilesystem::new();
        fs.expect_current_directory()
            .returning(|| Ok(PathBuf::from(ROOT)));
        fs
    }

    fn engine(
        fs: MockFilesystem,
        runner: MockCommandRunner,
        renderer: MockTemplateRenderer,
        options: EngineOptions,
    ) -> ScaffoldEngine {
        ScaffoldEngine::new(Box::new(fs), Box::new(runner), Box::new(renderer), options)
    }

    fn run(engine: &ScaffoldEngine, source: &str) -> ForgeResult<ScaffoldReport> {
        engine.run(&parse(source).expect("source parses"))
    }

    #[test]
    fn disallowed_command_never_runs() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_is_allowed()
            .withf(|program| program == "rm")
            .return_const(false);
        runner.expect_run().never();

        let engine = engine(
            filesystem(),
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, r#"@exec "rm -rf /";"#).unwrap_err();

        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::DisallowedCommand { ref program, .. })
                if program == "rm"
        ));
    }

    #[test]
    fn exec_runs_in_resolved_directory_with_timeout() {
        let mut runner = MockCommandRunner::new();
        runner.expect_is_allowed().return_const(true);
        runner
            .expect_run()
            .withf(|command, dir, timeout| {
                command == "git init"
                    && dir == Path::new("/work/app")
                    && *timeout == Some(Duration::from_secs(5))
            })
            .times(1)
            .returning(|_, _, _| Ok(CommandOutput::success()));

        let engine = engine(
            filesystem(),
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let report = run(&engine, r#"@exec "git init" at "app" timeout 5;"#).unwrap();
        assert_eq!(report.commands(), 1);
    }

    #[test]
    fn nonzero_exit_is_command_failure() {
        let mut runner = MockCommandRunner::new();
        runner.expect_is_allowed().return_const(true);
        runner.expect_run().returning(|_, _, _| {
            Ok(CommandOutput {
                status: Some(1),
                stdout: String::new(),
                stderr: "boom".into(),
            })
        });

        let engine = engine(
            filesystem(),
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, r#"@exec "dotnet build";"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::CommandFailed {
                exit_code: Some(1),
                ..
            })
        ));
    }

    #[test]
    fn negative_timeout_is_type_error() {
        let mut runner = MockCommandRunner::new();
        runner.expect_is_allowed().never();

        let engine = engine(
            filesystem(),
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, r#"@exec "git status" timeout -1;"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn oversized_timeout_is_type_error() {
        let mut runner = MockCommandRunner::new();
        runner.expect_is_allowed().never();
        runner.expect_run().never();

        let engine = engine(
            filesystem(),
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default().dry_run(true),
        );
        let err = run(&engine, r#"@exec "git status" timeout 1e30;"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn dry_run_suppresses_mutations_but_reports_them() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(false);
        fs.expect_ensure_directory().never();
        fs.expect_write_text().never();

        let mut runner = MockCommandRunner::new();
        runner.expect_is_allowed().return_const(true);
        runner.expect_run().never();

        let engine = engine(
            fs,
            runner,
            MockTemplateRenderer::new(),
            EngineOptions::default().dry_run(true),
        );
        let report = run(
            &engine,
            r#"./src/ { a.txt { content: "a"; } } @exec "git init";"#,
        )
        .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.writes(), 2);
        assert_eq!(report.commands(), 1);
    }

    #[test]
    fn skip_mode_leaves_existing_files() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(true);
        fs.expect_read_text().never();
        fs.expect_write_text().never();

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let report = run(&engine, r#"a.txt { content: "new"; mode: "skip"; }"#).unwrap();

        assert_eq!(
            report.actions,
            vec![Action::FileSkipped {
                path: PathBuf::from("/work/a.txt")
            }]
        );
    }

    #[test]
    fn fail_mode_conflicts_with_existing_files() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(true);
        fs.expect_write_text().never();

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default().default_mode(WriteMode::Fail),
        );
        let err = run(&engine, r#"a.txt { content: "new"; }"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::FileConflict { .. })
        ));
    }

    #[test]
    fn unchanged_content_is_not_rewritten() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(true);
        fs.expect_read_text()
            .returning(|_| Ok("same".to_string()));
        fs.expect_write_text().never();

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let report = run(&engine, r#"a.txt { content: "same"; }"#).unwrap();
        assert_eq!(report.writes(), 0);
    }

    #[test]
    fn template_receives_file_properties() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(false);
        fs.expect_ensure_directory().returning(|_| Ok(()));
        fs.expect_write_text()
            .withf(|path, content| path == Path::new("/work/Svc.cs") && content == "rendered")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .withf(|name, model| {
                name == "class.tpl" && model.get("namespace") == Some(&Value::from("Acme"))
            })
            .times(1)
            .returning(|_, _| Ok("rendered".to_string()));

        let engine = engine(fs, MockCommandRunner::new(), renderer, EngineOptions::default());
        run(
            &engine,
            r#"Svc.cs { template: "class.tpl"; namespace: "Acme"; }"#,
        )
        .unwrap();
    }

    #[test]
    fn arity_mismatch_writes_nothing() {
        let mut fs = filesystem();
        fs.expect_exists().never();
        fs.expect_write_text().never();

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        for call in [r#"@include pair("a");"#, r#"@include pair("a", "b", "c");"#] {
            let source = format!(
                r#"@mixin pair($x, $y) {{ ${{x}}.txt {{ content: y; }} }} {call}"#
            );
            let err = run(&engine, &source).unwrap_err();
            assert!(matches!(
                err,
                ForgeError::Domain(DomainError::ArityMismatch { expected: 2, .. })
            ));
        }
    }

    #[test]
    fn mixin_body_does_not_see_caller_locals() {
        let engine = engine(
            filesystem(),
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(
            &engine,
            r#"@mixin show() { @if local { } } :root { local: "x"; @include show(); }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::UndefinedVariable { ref name }) if name == "local"
        ));
    }

    #[test]
    fn recursive_mixin_hits_depth_limit() {
        let engine = engine(
            filesystem(),
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, "@mixin again() { @include again(); } @include again();")
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::IncludeDepthExceeded { .. })
        ));
    }

    #[test]
    fn rules_nested_in_files_are_rejected() {
        let engine = engine(
            filesystem(),
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, r#"a.txt { content: "x"; inner/ { } }"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::NestedRuleInFile { .. })
        ));
    }

    #[test]
    fn cursor_and_scopes_are_restored_after_failure() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(true);

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let sheet = parse(
            r#"./a/ { :root { ./b/ { @foreach $i in [1] { c.txt { content: missing; } } } } }"#,
        )
        .unwrap();

        let mut execution = Execution::new(&engine).unwrap();
        assert!(execution.execute_block(&sheet.statements).is_err());
        assert_eq!(execution.cwd, PathBuf::from(ROOT));
        assert!(execution.directories.is_empty());
        assert!(execution.file.is_none());
        assert_eq!(execution.scopes.depth(), 0);
    }

    #[test]
    fn cancellation_stops_before_next_statement() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut fs = filesystem();
        fs.expect_exists().never();

        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default().cancel_flag(Arc::clone(&flag)),
        );
        let err = run(&engine, "./src/ { }").unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::Cancelled)
        ));
    }

    #[test]
    fn parent_dir_cannot_climb_above_root() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(false);
        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default().dry_run(true),
        );
        let err = run(&engine, "./a/ { ../../x/ { } }").unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::PathEscapesRoot { .. })
        ));
    }

    #[test]
    fn parent_dir_inside_root_is_allowed() {
        let mut fs = filesystem();
        fs.expect_exists().return_const(false);
        let engine = engine(
            fs,
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default().dry_run(true),
        );
        let report = run(&engine, "./a/ { ../b/ { } }").unwrap();
        assert!(report.actions.iter().any(|a| matches!(
            a,
            Action::DirectoryCreated { path } if path == &PathBuf::from(ROOT).join("b")
        )));
    }

    #[test]
    fn absolute_interpolated_paths_are_rejected() {
        let engine = engine(
            filesystem(),
            MockCommandRunner::new(),
            MockTemplateRenderer::new(),
            EngineOptions::default(),
        );
        let err = run(&engine, r#"dir: "/etc"; ${dir}/ { }"#).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Domain(DomainError::AbsolutePathNotAllowed { .. })
        ));
    }
}
