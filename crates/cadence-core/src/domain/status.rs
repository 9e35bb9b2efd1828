//! Status, condition and activity enums shared across a cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an integration cycle.
///
/// There is no numeric severity order between variants; combining two
/// statuses follows the rules in `IntegrationResult::merge`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IntegrationStatus {
    #[default]
    Unknown,
    Success,
    Failure,
    Exception,
    Cancelled,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Unknown => "Unknown",
            IntegrationStatus::Success => "Success",
            IntegrationStatus::Failure => "Failure",
            IntegrationStatus::Exception => "Exception",
            IntegrationStatus::Cancelled => "Cancelled",
        }
    }

    /// `Failure` or `Exception`: the states that open or extend a failure streak.
    pub fn is_broken(&self) -> bool {
        matches!(self, IntegrationStatus::Failure | IntegrationStatus::Exception)
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a build may run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BuildCondition {
    ForceBuild,
    IfModificationExists,
    #[default]
    NoBuild,
}

impl BuildCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildCondition::ForceBuild => "ForceBuild",
            BuildCondition::IfModificationExists => "IfModificationExists",
            BuildCondition::NoBuild => "NoBuild",
        }
    }
}

impl fmt::Display for BuildCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a project is currently doing, as reported to the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectActivity {
    #[default]
    Sleeping,
    CheckingModifications,
    Building,
}

/// Source-control operations reported to the progress sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceControlOperation {
    CheckForModifications,
    GetSource,
}

/// Progress of a single reported operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemBuildStatus {
    Running,
    CompletedSuccess,
    CompletedFailed,
}

impl ItemBuildStatus {
    pub fn completed(success: bool) -> Self {
        if success {
            ItemBuildStatus::CompletedSuccess
        } else {
            ItemBuildStatus::CompletedFailed
        }
    }
}
