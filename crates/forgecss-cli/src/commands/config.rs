//! `forgecss config`: inspect the effective configuration.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            if output.is_json() {
                output.json(&value)?;
            } else {
                output.print(&render_value(&value))?;
            }
        }

        ConfigCommands::List => {
            if output.is_json() {
                output.json(&config)?;
            } else {
                output.header("Current Configuration:")?;
                let serialised = config
                    .to_toml()
                    .with_cli_context(|| "Failed to serialise config")?;
                output.print(serialised.trim_end())?;
            }
        }

        ConfigCommands::Path => {
            let path = config.source.clone().unwrap_or_else(AppConfig::config_path);
            output.print(&path.display().to_string())?;
            if config.source.is_none() {
                output.info("No configuration file found; using built-in defaults")?;
            }
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<serde_json::Value> {
    config.get(key).ok_or_else(|| CliError::UnknownConfigKey {
        key: key.to_owned(),
    })
}

/// Strings print bare, everything else as compact JSON.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
