// src/config/error.rs

use thiserror::Error;

/// Fatal configuration errors. Anything here aborts before integration starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read cosmology configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse cosmology configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed numeric input for parameter `{0}`")]
    Malformed(&'static str),
    #[error("missing input for parameter `{0}`")]
    Missing(&'static str),
}
