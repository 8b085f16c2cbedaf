//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "forgecss",
    bin_name = "forgecss",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Scaffold project trees from CSS-like stylesheets",
    long_about = "ForgeCSS reads a stylesheet describing directories, files and \
                  setup commands, and applies it to a target directory. Re-running \
                  an unchanged stylesheet performs no writes.",
    after_help = "EXAMPLES:\n\
        \x20 forgecss apply service.fcss --dry-run\n\
        \x20 forgecss apply service.fcss --root ./out --templates ./templates\n\
        \x20 forgecss check service.fcss --output-format json\n\
        \x20 forgecss completions bash > /usr/share/bash-completion/completions/forgecss",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a stylesheet to the target directory.
    #[command(
        visible_alias = "a",
        about = "Apply a stylesheet",
        after_help = "EXAMPLES:\n\
            \x20 forgecss apply app.fcss\n\
            \x20 forgecss apply app.fcss --dry-run\n\
            \x20 forgecss apply app.fcss --mode skip --allow npm"
    )]
    Apply(ApplyArgs),

    /// Parse a stylesheet and print its outline without running it.
    #[command(
        about = "Check a stylesheet's syntax",
        after_help = "EXAMPLES:\n\
            \x20 forgecss check app.fcss\n\
            \x20 forgecss check app.fcss --output-format json"
    )]
    Check(CheckArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 forgecss completions bash > ~/.local/share/bash-completion/completions/forgecss\n\
            \x20 forgecss completions zsh  > ~/.zfunc/_forgecss\n\
            \x20 forgecss completions fish > ~/.config/fish/completions/forgecss.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the ForgeCSS configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 forgecss config get engine.default_mode\n\
            \x20 forgecss config list\n\
            \x20 forgecss config path"
    )]
    Config(ConfigCommands),
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `forgecss apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Stylesheet to apply.
    #[arg(value_name = "FILE", help = "Stylesheet to apply")]
    pub file: PathBuf,

    /// Log every action without touching the filesystem or running commands.
    #[arg(long = "dry-run", help = "Show what would happen without doing it")]
    pub dry_run: bool,

    /// Directory relative selectors start from.
    #[arg(
        short = 'r',
        long = "root",
        value_name = "DIR",
        help = "Target directory (default: current directory)"
    )]
    pub root: Option<PathBuf>,

    /// Write mode for files that do not declare one.
    #[arg(
        short = 'm',
        long = "mode",
        value_name = "MODE",
        value_enum,
        help = "Default write mode"
    )]
    pub mode: Option<ModeArg>,

    /// Directory holding templates referenced by `template:`.
    #[arg(
        short = 't',
        long = "templates",
        value_name = "DIR",
        help = "Templates directory"
    )]
    pub templates: Option<PathBuf>,

    /// Extra programs `@exec` may run, on top of the configured list.
    #[arg(
        long = "allow",
        value_name = "PROGRAM",
        help = "Allow an extra program for @exec (repeatable)"
    )]
    pub allow: Vec<String>,
}

/// Write modes as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ModeArg {
    OverwriteIfChanged,
    Skip,
    Fail,
}

impl From<ModeArg> for forgecss_core::domain::WriteMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::OverwriteIfChanged => Self::OverwriteIfChanged,
            ModeArg::Skip => Self::Skip,
            ModeArg::Fail => Self::Fail,
        }
    }
}

// ── check ─────────────────────────────────────────────────────────────────────

/// Arguments for `forgecss check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Stylesheet to check.
    #[arg(value_name = "FILE", help = "Stylesheet to check")]
    pub file: PathBuf,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `forgecss completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `forgecss config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `engine.default_mode`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
