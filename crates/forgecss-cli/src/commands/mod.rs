//! One module per subcommand. Each exposes an `execute` entry point.

pub mod apply;
pub mod check;
pub mod completions;
pub mod config;
