//! Source-control capability consumed by the orchestrator.

use async_trait::async_trait;

use crate::domain::{BuildResult, IntegrationResult, IntegrationSummary, Modification};

/// Pluggable access to a project's source-control system.
///
/// Every operation may fail; the orchestrator decides how each failure is
/// recorded on the cycle's result.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Changes that landed between the previous cycle and `to`.
    async fn get_modifications(
        &self,
        from: &IntegrationSummary,
        to: &IntegrationResult,
    ) -> BuildResult<Vec<Modification>>;

    /// Bring the working directory up to date.
    async fn get_source(&self, result: &mut IntegrationResult) -> BuildResult<()>;

    /// Apply the cycle's label to the repository (tag, label, etc.).
    async fn label_source_control(&self, result: &mut IntegrationResult) -> BuildResult<()>;
}

/// Source control that never reports changes and never touches the tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSourceControl;

#[async_trait]
impl SourceControl for NullSourceControl {
    async fn get_modifications(
        &self,
        _from: &IntegrationSummary,
        _to: &IntegrationResult,
    ) -> BuildResult<Vec<Modification>> {
        Ok(Vec::new())
    }

    async fn get_source(&self, _result: &mut IntegrationResult) -> BuildResult<()> {
        Ok(())
    }

    async fn label_source_control(&self, _result: &mut IntegrationResult) -> BuildResult<()> {
        Ok(())
    }
}
