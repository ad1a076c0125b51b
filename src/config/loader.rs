use crate::config::schema::{RewriteConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config is given.
pub const CONFIG_FILE: &str = "rew.toml";

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
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
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

impl ConfigError {
    /// The file the error came from, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path.as_path()),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path()
            .map_or_else(|| CONFIG_FILE.to_string(), |p| p.display().to_string());
        match self {
            ConfigError::Io { source, .. } => write!(f, "cannot read {name}: {source}"),
            // toml_edit reports line and column itself
            ConfigError::Toml { path: Some(_), source } => {
                write!(f, "{name} is not a valid {CONFIG_FILE}: {source}")
            }
            ConfigError::Toml { path: None, source } => {
                write!(f, "invalid {CONFIG_FILE}: {source}")
            }
            ConfigError::Validation { source, .. } => {
                let count = source.issues.len();
                let noun = if count == 1 { "setting" } else { "settings" };
                write!(f, "{name} has {count} invalid {noun}:")?;
                for issue in &source.issues {
                    write!(f, "\n  {issue}")?;
                }
                Ok(())
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
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RewriteConfig, ConfigError> {
    let config: RewriteConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RewriteConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// `dir/rew.toml` when it exists, defaults otherwise.
pub fn load_or_default(dir: impl AsRef<Path>) -> Result<RewriteConfig, ConfigError> {
    let path = dir.as_ref().join(CONFIG_FILE);
    if path.is_file() {
        tracing::debug!(path = %path.display(), "loading config");
        load_from_path(&path)
    } else {
        Ok(RewriteConfig::default())
    }
}
