//! Error taxonomy for integration cycles.

use serde::{Deserialize, Serialize};

/// A failure raised at a pipeline stage boundary.
///
/// Stage failures are recorded on the `IntegrationResult` rather than
/// propagated out of a cycle. When a second failure is attached to a result
/// that already carries one, both are kept in a [`BuildFailure::Multiple`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildFailure {
    #[error("source control error: {message}")]
    SourceControl { message: String },

    #[error("labelling failed: {message}")]
    Labelling { message: String },

    #[error("pre-build failed: {message}")]
    Prebuild { message: String },

    #[error("task {task} failed: {message}")]
    Task { task: String, message: String },

    #[error("publishing failed: {message}")]
    Publish { message: String },

    #[error("io error: {message}")]
    Io { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("{} failures occurred during the integration", .failures.len())]
    Multiple { failures: Vec<BuildFailure> },
}

impl BuildFailure {
    pub fn source_control(message: impl Into<String>) -> Self {
        BuildFailure::SourceControl {
            message: message.into(),
        }
    }

    pub fn labelling(message: impl Into<String>) -> Self {
        BuildFailure::Labelling {
            message: message.into(),
        }
    }

    pub fn prebuild(message: impl Into<String>) -> Self {
        BuildFailure::Prebuild {
            message: message.into(),
        }
    }

    pub fn task(task: impl Into<String>, message: impl Into<String>) -> Self {
        BuildFailure::Task {
            task: task.into(),
            message: message.into(),
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        BuildFailure::Publish {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BuildFailure::Configuration {
            message: message.into(),
        }
    }

    /// Combine `self` with a later failure, preserving occurrence order.
    ///
    /// A composite on either side is flattened so the resulting list holds
    /// only individual failures.
    pub fn combine(self, later: BuildFailure) -> BuildFailure {
        let mut failures = self.into_failures();
        failures.extend(later.into_failures());
        BuildFailure::Multiple { failures }
    }

    /// Individual failures in occurrence order.
    pub fn failures(&self) -> Vec<&BuildFailure> {
        match self {
            BuildFailure::Multiple { failures } => failures.iter().collect(),
            other => vec![other],
        }
    }

    fn into_failures(self) -> Vec<BuildFailure> {
        match self {
            BuildFailure::Multiple { failures } => failures,
            other => vec![other],
        }
    }
}

impl From<std::io::Error> for BuildFailure {
    fn from(err: std::io::Error) -> Self {
        BuildFailure::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for pipeline stages.
pub type BuildResult<T> = std::result::Result<T, BuildFailure>;

/// Errors produced outside a running cycle (configuration, parsing).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid property path '{path}': {reason}")]
    InvalidPropertyPath { path: String, reason: String },

    #[error("property not found: {0}")]
    PropertyNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
