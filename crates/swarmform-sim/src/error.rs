//! Simulator error types

use std::path::PathBuf;

use thiserror::Error;

use swarmform_core::{ConfigurationError, FormationError};

/// Errors raised while loading or running a session
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Formation(#[from] FormationError),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
