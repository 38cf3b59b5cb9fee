// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("scene '{0}' is reserved for shared resources")]
    ReservedScene(String),

    #[error("invalid scene name: {0:?}")]
    InvalidScene(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single compile.
///
/// This is the error half of a shared build future, so it must be `Clone`:
/// every caller waiting on the same compile receives its own copy. The
/// underlying error chain is flattened into `message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("scene '{scene}' failed to build: {message}")]
pub struct BuildError {
    pub scene: String,
    pub message: String,
}

impl BuildError {
    pub fn new(scene: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            scene: scene.into(),
            message: format!("{err:#}"),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScenewatchError>;
