use std::path::PathBuf;

use thiserror::Error;

use crate::app_dirs::AppDirError;
use crate::dashboard::SchemeError;

/// Errors that may occur while loading or saving dashboard settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be resolved or created.
    #[error("No usable config directory: {0}")]
    AppDir(#[from] AppDirError),
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse the TOML settings file.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// A `[classification.*]` section does not describe a valid bucket scheme.
    #[error("Invalid [classification.{section}] in config: {source}")]
    Scheme {
        section: &'static str,
        source: SchemeError,
    },
}
