//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the `EngineOptions` built
//! from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `FORGECSS__ENGINE__DEFAULT_MODE=skip`,
//!    `FORGECSS__ENGINE__ALLOWED_COMMANDS=git,dotnet,npm`, ...
//! 3. Config file (`--config`, or the platform config directory)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use forgecss_adapters::command::DEFAULT_ALLOWED_COMMANDS;
use forgecss_core::domain::WriteMode;

use crate::cli::OutputFormat;

const ENV_PREFIX: &str = "FORGECSS";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine behaviour.
    pub engine: EngineConfig,
    /// Template lookup.
    pub templates: TemplateConfig,
    /// Output settings.
    pub output: OutputConfig,

    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_mode: WriteMode,
    pub allowed_commands: Vec<String>,
    /// Per-command timeout. `0` disables it.
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_mode: WriteMode::default(),
            allowed_commands: DEFAULT_ALLOWED_COMMANDS.iter().map(|c| c.to_string()).collect(),
            command_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then the
    /// environment.
    ///
    /// An explicit `config_file` must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required)
    }

    fn load_from(path: &Path, required: bool) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to serialise built-in defaults")?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("engine.allowed_commands")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Invalid configuration values")?;
        if path.is_file() {
            config.source = Some(path.to_path_buf());
        }
        Ok(config)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.forgecss.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "forgecss", "forgecss")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".forgecss.toml"))
    }

    /// Look up a dotted key such as `engine.default_mode`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let tree = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&tree, |node, part| node.get(part))
            .cloned()
    }

    /// The whole configuration as TOML, for `config list`.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_allow_dotnet_and_git() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.engine.allowed_commands, vec!["dotnet", "git"]);
        assert_eq!(cfg.engine.default_mode, WriteMode::OverwriteIfChanged);
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(cfg.engine.command_timeout_secs, 300);
        assert!(cfg.source.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[engine]\ndefault_mode = \"skip\"\nallowed_commands = [\"git\", \"npm\"]\n\n[templates]\ndir = \"tpl\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.engine.default_mode, WriteMode::Skip);
        assert_eq!(cfg.engine.allowed_commands, vec!["git", "npm"]);
        assert_eq!(cfg.templates.dir, Some(PathBuf::from("tpl")));
        assert_eq!(cfg.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn dotted_get() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.get("engine.default_mode"),
            Some(serde_json::Value::from("overwrite-if-changed"))
        );
        assert_eq!(cfg.get("engine.nope"), None);
    }

    #[test]
    fn renders_as_toml() {
        let text = AppConfig::default().to_toml().unwrap();
        assert!(text.contains("[engine]"));
        assert!(text.contains("default_mode = \"overwrite-if-changed\""));
    }
}
