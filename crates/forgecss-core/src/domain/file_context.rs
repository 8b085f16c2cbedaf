//! Per-file property bag and write modes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{error::DomainError, value::Value};

// ── WriteMode ────────────────────────────────────────────────────────────────

/// Conflict policy applied when a target file may already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Write unless the existing content is byte-identical.
    #[default]
    OverwriteIfChanged,
    /// Leave existing files untouched.
    Skip,
    /// Refuse to touch existing files.
    Fail,
}

impl WriteMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OverwriteIfChanged => "overwrite-if-changed",
            Self::Skip => "skip",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite-if-changed" => Ok(Self::OverwriteIfChanged),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(DomainError::InvalidWriteMode {
                mode: other.to_owned(),
            }),
        }
    }
}

// ── FileContext ──────────────────────────────────────────────────────────────

const TEMPLATE: &str = "template";
const CONTENT: &str = "content";
const MODE: &str = "mode";

/// Where a file's content comes from once its body has run.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// Render the named template with the given model.
    Template {
        name: String,
        model: IndexMap<String, Value>,
    },
    /// Literal content, already evaluated.
    Content(Value),
}

/// Properties declared inside a file rule.
///
/// `template`, `content` and `mode` have typed slots; every other key lands
/// in the open `extras` map and is passed to the template renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    path: PathBuf,
    template: Option<String>,
    content: Option<Value>,
    mode: Option<WriteMode>,
    extras: IndexMap<String, Value>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            template: None,
            content: None,
            mode: None,
            extras: IndexMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Option<WriteMode> {
        self.mode
    }

    pub fn extras(&self) -> &IndexMap<String, Value> {
        &self.extras
    }

    /// Record one declaration. Each key may be recorded once per file.
    pub fn record(&mut self, key: &str, value: Value) -> Result<(), DomainError> {
        let already_set = match key {
            TEMPLATE => self.template.is_some(),
            CONTENT => self.content.is_some(),
            MODE => self.mode.is_some(),
            _ => self.extras.contains_key(key),
        };
        if already_set {
            return Err(DomainError::DuplicateFileProperty {
                path: self.display_path(),
                key: key.to_owned(),
            });
        }

        match key {
            TEMPLATE => match value {
                Value::String(name) => self.template = Some(name),
                other => {
                    return Err(DomainError::type_mismatch(
                        format!("'template' of {}", self.display_path()),
                        "string",
                        other.type_name(),
                    ));
                }
            },
            CONTENT => self.content = Some(value),
            MODE => match value {
                Value::String(mode) => self.mode = Some(mode.parse()?),
                other => {
                    return Err(DomainError::type_mismatch(
                        format!("'mode' of {}", self.display_path()),
                        "string",
                        other.type_name(),
                    ));
                }
            },
            _ => {
                self.extras.insert(key.to_owned(), value);
            }
        }
        Ok(())
    }

    /// Decide where the content comes from: exactly one of template or
    /// content must have been recorded.
    pub fn into_source(self) -> Result<FileSource, DomainError> {
        match (self.template, self.content) {
            (Some(_), Some(_)) => Err(DomainError::ConflictingFileContent {
                path: self.path.display().to_string(),
            }),
            (None, None) => Err(DomainError::MissingFileContent {
                path: self.path.display().to_string(),
            }),
            (None, Some(content)) => Ok(FileSource::Content(content)),
            (Some(name), None) => {
                let mut model = IndexMap::with_capacity(self.extras.len() + 2);
                model.insert(TEMPLATE.to_owned(), Value::String(name.clone()));
                if let Some(mode) = self.mode {
                    model.insert(MODE.to_owned(), Value::from(mode.as_str()));
                }
                model.extend(self.extras);
                Ok(FileSource::Template { name, model })
            }
        }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}
