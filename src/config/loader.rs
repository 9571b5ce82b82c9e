use crate::config::schema::RuleSetConfig;
use crate::ruleset::{RuleSet, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Name given to rule sets loaded from a string without `meta.name`.
pub const INLINE_NAME: &str = "inline";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    UnknownRuleSet {
        name: String,
        searched: Vec<PathBuf>,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule set from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rule set TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rule set TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule set ({}):\n{}", path.display(), source),
                None => write!(f, "invalid rule set:\n{}", source),
            },
            ConfigError::UnknownRuleSet { name, searched } => {
                write!(f, "unknown rule set '{name}' (not a file, not built in")?;
                for dir in searched {
                    write!(f, ", not in {}", dir.display())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::UnknownRuleSet { .. } => None,
        }
    }
}

/// Parse TOML into the raw config without building rules.
pub fn parse_str(input: &str) -> Result<RuleSetConfig, ConfigError> {
    toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })
}

pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    build_named(parse_str(input)?, INLINE_NAME)
}

/// Load a rule set file. A blank `meta.name` falls back to the file stem.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(INLINE_NAME);
    parse_str(&contents)
        .and_then(|config| build_named(config, stem))
        .map_err(|error| error.with_path(path))
}

pub(crate) fn build_named(
    config: RuleSetConfig,
    default_name: &str,
) -> Result<RuleSet, ConfigError> {
    config
        .build(default_name)
        .map_err(|source| ConfigError::Validation { path: None, source })
}
