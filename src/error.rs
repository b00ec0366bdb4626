//! Error types

use std::io;
use thiserror::Error;

/// Errors raised while loading or saving the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced synchronously by detector setup and operation calls.
///
/// Keystroke handling and decoding never produce these; a failed decode is
/// reported through notifications instead.
#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("Prefix character must be a single character, got {0:?}")]
    InvalidPrefix(String),
    #[error("Unknown parser '{0}'")]
    UnknownParser(String),
    #[error("Interdigit timeout must be greater than zero")]
    InvalidTimeout,
    #[error("Operation '{0}' does not exist on the card swipe detector")]
    UnknownOperation(String),
    #[error("Operation '{0}' needs an argument")]
    MissingArgument(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
