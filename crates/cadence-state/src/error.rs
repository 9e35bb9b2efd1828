//! Error types for cadence-state

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or saving integration state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A state file exists but does not hold a summary.
    #[error("corrupt state file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("could not persist state file {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    #[error("invalid project name for state storage: {0:?}")]
    InvalidProject(String),
}

impl From<StateError> for cadence_core::BuildFailure {
    fn from(err: StateError) -> Self {
        cadence_core::BuildFailure::Io {
            message: err.to_string(),
        }
    }
}
