use crate::batch::schema::{EditBatch, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk encoding of an edit batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Toml,
    Json,
}

impl BatchFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => BatchFormat::Json,
            _ => BatchFormat::Toml,
        }
    }
}

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
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = Some(path.to_path_buf());
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml { path, source },
            ConfigError::Json { path: None, source } => ConfigError::Json { path, source },
            ConfigError::Validation { path: None, source } => {
                ConfigError::Validation { path, source }
            }
            other => other,
        }
    }

    fn location(path: &Option<PathBuf>) -> String {
        path.as_ref()
            .map(|p| format!(" ({})", p.display()))
            .unwrap_or_default()
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read edit batch from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => write!(
                f,
                "failed to parse edit batch TOML{}: {}",
                Self::location(path),
                source
            ),
            ConfigError::Json { path, source } => write!(
                f,
                "failed to parse edit batch JSON{}: {}",
                Self::location(path),
                source
            ),
            ConfigError::Validation { path, source } => {
                write!(f, "invalid edit batch{}: {}", Self::location(path), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str, format: BatchFormat) -> Result<EditBatch, ConfigError> {
    let batch: EditBatch = match format {
        BatchFormat::Toml => toml_edit::de::from_str(input)
            .map_err(|source| ConfigError::Toml { path: None, source })?,
        BatchFormat::Json => serde_json::from_str(input)
            .map_err(|source| ConfigError::Json { path: None, source })?,
    };
    batch
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(batch)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditBatch, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, BatchFormat::from_path(path)).map_err(|error| error.with_path(path))
}
