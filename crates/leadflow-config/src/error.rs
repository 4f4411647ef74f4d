//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the given path. `load_or_default` treats this as "use defaults".
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`crate::Config`].
    #[error("Failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A `${VAR}` reference names an unset variable.
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    /// A loaded or overlaid value failed validation.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
