//! The project-side half of an integration cycle.

use async_trait::async_trait;

use cadence_core::{
    BuildResult, IntegrationRequest, IntegrationResult, IntegrationSummary, ItemBuildStatus,
    ProjectActivity, SourceControl, SourceControlOperation,
};

/// Everything the runner needs from the project it integrates.
///
/// Stage methods return [`BuildResult`]; the runner decides how a failure is
/// recorded on the cycle.
#[async_trait]
pub trait IntegrationRunnerTarget: Send + Sync {
    fn name(&self) -> &str;

    fn source_control(&self) -> &dyn SourceControl;

    /// Called before a result exists for the cycle.
    async fn initialise_for_build(&self, request: &IntegrationRequest) -> BuildResult<()>;

    /// Label for the cycle that follows `last`.
    async fn create_label(&self, last: &IntegrationSummary) -> BuildResult<String>;

    async fn prebuild(&self, result: &mut IntegrationResult) -> BuildResult<()>;

    /// Run the build tasks.
    async fn run(&self, result: &mut IntegrationResult) -> BuildResult<()>;

    async fn publish_results(&self, result: &IntegrationResult) -> BuildResult<()>;

    /// Drop status messages left over from the previous cycle.
    fn clear_not_needed_messages(&self);

    fn set_activity(&self, activity: ProjectActivity);

    fn record_source_control_operation(
        &self,
        operation: SourceControlOperation,
        status: ItemBuildStatus,
    );
}
