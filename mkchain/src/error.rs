//! Error types for mkchain

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MkchainError>;

#[derive(Error, Debug)]
pub enum MkchainError {
    #[error("Invalid argument --number-of-nodes {0}, must be 1 or more")]
    InvalidNodeCount(i64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Container {image} exited with {status}:\n{output}")]
    ContainerFailed {
        image: String,
        status: String,
        output: String,
    },

    #[error("Unexpected output from {what}: {reason}")]
    OutputFormat { what: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl MkchainError {
    pub(crate) fn output_format(what: impl Into<String>, reason: impl Into<String>) -> Self {
        MkchainError::OutputFormat {
            what: what.into(),
            reason: reason.into(),
        }
    }
}
