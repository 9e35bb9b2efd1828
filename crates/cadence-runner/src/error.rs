//! Errors that escape an integration cycle.

use std::path::PathBuf;

use cadence_core::BuildFailure;
use cadence_state::StateError;

/// Failures outside the build stages.
///
/// Stage failures are recorded on the result and never surface here; only
/// initialisation and completion problems do.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to initialise project for build: {0}")]
    Initialise(BuildFailure),

    #[error("failed to create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to record integration: {0}")]
    State(#[from] StateError),

    #[error("failed to publish results: {0}")]
    Publish(BuildFailure),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
