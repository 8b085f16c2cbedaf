//! Implementation of the `forgecss apply` command.
//!
//! Responsibility: read the stylesheet, wire the local adapters into a
//! `ScaffoldEngine`, and display the report. No evaluation logic lives here.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};

use forgecss_adapters::{DirectoryRenderer, LocalFilesystem, ProcessRunner};
use forgecss_core::{
    application::{Action, EngineOptions, ScaffoldEngine, ScaffoldReport},
    domain::{Stylesheet, parse},
    error::ForgeError,
};

use crate::{
    cli::ApplyArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `forgecss apply` command.
///
/// 1. Read and parse the stylesheet
/// 2. Build the adapters from config plus flags
/// 3. Run the engine
/// 4. Print the report
#[instrument(skip_all, fields(file = %args.file.display(), dry_run = args.dry_run))]
pub fn execute(args: ApplyArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let sheet = load_stylesheet(&args.file)?;
    debug!(statements = sheet.len(), "Stylesheet parsed");

    validate_allow_list(&args.allow)?;
    let runner = build_runner(&args, &config);
    let renderer = DirectoryRenderer::new(templates_dir(&args, &config));
    debug!(
        templates = %renderer.root().display(),
        allowed = ?runner.allowed().collect::<Vec<_>>(),
        "Adapters ready"
    );

    let engine = ScaffoldEngine::new(
        Box::new(LocalFilesystem::new()),
        Box::new(runner),
        Box::new(renderer),
        engine_options(&args, &config),
    );
    let report = engine.run(&sheet)?;

    info!(
        actions = report.actions.len(),
        writes = report.writes(),
        commands = report.commands(),
        "Stylesheet applied"
    );
    show_report(&report, &output)
}

/// Read and parse a stylesheet from disk.
pub(crate) fn load_stylesheet(path: &Path) -> CliResult<Stylesheet> {
    if !path.is_file() {
        return Err(CliError::StylesheetNotFound {
            path: path.to_path_buf(),
        });
    }
    let source = fs::read_to_string(path)
        .with_cli_context(|| format!("Failed to read {}", path.display()))?;
    parse(&source).map_err(|e| CliError::Core(ForgeError::from(e)))
}

/// `--allow` takes bare program names, not command lines.
fn validate_allow_list(programs: &[String]) -> CliResult<()> {
    match programs
        .iter()
        .find(|p| p.is_empty() || p.chars().any(char::is_whitespace))
    {
        Some(bad) => Err(CliError::InvalidInput {
            message: format!("--allow expects a program name, got '{bad}'"),
        }),
        None => Ok(()),
    }
}

fn build_runner(args: &ApplyArgs, config: &AppConfig) -> ProcessRunner {
    ProcessRunner::with_allowed(
        config
            .engine
            .allowed_commands
            .iter()
            .chain(args.allow.iter()),
    )
}

/// `--templates`, then `templates.dir`, then the stylesheet's directory.
fn templates_dir(args: &ApplyArgs, config: &AppConfig) -> PathBuf {
    args.templates
        .clone()
        .or_else(|| config.templates.dir.clone())
        .unwrap_or_else(|| match args.file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
}

fn engine_options(args: &ApplyArgs, config: &AppConfig) -> EngineOptions {
    let mode = args.mode.map_or(config.engine.default_mode, Into::into);
    let mut options = EngineOptions::default()
        .dry_run(args.dry_run)
        .default_mode(mode);
    if let Some(root) = &args.root {
        options = options.root(root.clone());
    }
    if config.engine.command_timeout_secs > 0 {
        options = options.command_timeout(Duration::from_secs(config.engine.command_timeout_secs));
    }
    options
}

fn show_report(report: &ScaffoldReport, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        output.json(report)?;
        return Ok(());
    }

    if report.dry_run {
        output.header("Dry run: nothing was written")?;
    }
    for action in &report.actions {
        output.action(action)?;
    }

    let skipped = report
        .actions
        .iter()
        .filter(|a| matches!(a, Action::FileSkipped { .. }))
        .count();
    if skipped > 0 {
        output.warning(&format!(
            "{skipped} existing file(s) left untouched because of mode: skip"
        ))?;
    }

    if report.writes() == 0 && report.commands() == 0 {
        output.info("Up to date, nothing to do")?;
    } else {
        let verb = if report.dry_run { "Would make" } else { "Made" };
        output.success(&format!(
            "{verb} {} change(s) and run {} command(s)",
            report.writes(),
            report.commands()
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModeArg;
    use forgecss_core::domain::WriteMode;
    use tempfile::TempDir;

    fn args(file: &str) -> ApplyArgs {
        ApplyArgs {
            file: PathBuf::from(file),
            dry_run: false,
            root: None,
            mode: None,
            templates: None,
            allow: Vec::new(),
        }
    }

    #[test]
    fn templates_default_to_stylesheet_directory() {
        let cfg = AppConfig::default();
        assert_eq!(templates_dir(&args("site/app.fcss"), &cfg), PathBuf::from("site"));
        assert_eq!(templates_dir(&args("app.fcss"), &cfg), PathBuf::from("."));
    }

    #[test]
    fn templates_flag_beats_config() {
        let mut cfg = AppConfig::default();
        cfg.templates.dir = Some(PathBuf::from("from-config"));
        assert_eq!(templates_dir(&args("a.fcss"), &cfg), PathBuf::from("from-config"));

        let mut with_flag = args("a.fcss");
        with_flag.templates = Some(PathBuf::from("from-flag"));
        assert_eq!(templates_dir(&with_flag, &cfg), PathBuf::from("from-flag"));
    }

    #[test]
    fn allow_flag_extends_config() {
        let mut a = args("a.fcss");
        a.allow = vec!["NPM".into()];
        let runner = build_runner(&a, &AppConfig::default());
        assert_eq!(runner.allowed().collect::<Vec<_>>(), vec!["dotnet", "git", "npm"]);
    }

    #[test]
    fn allow_rejects_command_lines() {
        assert!(validate_allow_list(&["npm".into()]).is_ok());
        let err = validate_allow_list(&["npm install".into()]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(validate_allow_list(&[String::new()]).is_err());
    }

    #[test]
    fn mode_flag_beats_config() {
        let mut cfg = AppConfig::default();
        cfg.engine.default_mode = WriteMode::Fail;
        assert_eq!(engine_options(&args("a"), &cfg).default_mode, WriteMode::Fail);

        let mut a = args("a");
        a.mode = Some(ModeArg::Skip);
        assert_eq!(engine_options(&a, &cfg).default_mode, WriteMode::Skip);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let mut cfg = AppConfig::default();
        assert_eq!(
            engine_options(&args("a"), &cfg).command_timeout,
            Some(Duration::from_secs(300))
        );
        cfg.engine.command_timeout_secs = 0;
        assert_eq!(engine_options(&args("a"), &cfg).command_timeout, None);
    }

    #[test]
    fn missing_stylesheet_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_stylesheet(&dir.path().join("nope.fcss")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn syntax_error_is_user_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.fcss");
        fs::write(&path, "./src/ {").unwrap();
        let err = load_stylesheet(&path).unwrap_err();
        assert!(err.to_string().contains("syntax error"));
        assert_eq!(err.exit_code(), 2);
    }
}
