//! The integration cycle state machine.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::Instrument;

use cadence_core::obs::{
    emit_build_skipped, emit_integration_completed, emit_integration_started,
    emit_modifications_checked, emit_source_control_failure, emit_stage_failure, IntegrationSpan,
};
use cadence_core::{
    BuildResult, IntegrationRequest, IntegrationResult, IntegrationStatus, IntegrationSummary,
    ItemBuildStatus, ProjectActivity, QuietPeriod, SourceControlOperation,
};
use cadence_state::IntegrationResultManager;

use crate::error::{Result, RunnerError};
use crate::target::IntegrationRunnerTarget;

/// Drives one project through integration cycles.
///
/// Overlapping `integrate` calls on the same runner are queued.
pub struct IntegrationRunner {
    result_manager: Arc<dyn IntegrationResultManager>,
    target: Arc<dyn IntegrationRunnerTarget>,
    quiet_period: Arc<dyn QuietPeriod>,
    cycle_lock: Mutex<()>,
}

impl IntegrationRunner {
    pub fn new(
        result_manager: Arc<dyn IntegrationResultManager>,
        target: Arc<dyn IntegrationRunnerTarget>,
        quiet_period: Arc<dyn QuietPeriod>,
    ) -> Self {
        Self {
            result_manager,
            target,
            quiet_period,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one cycle for `request`.
    ///
    /// Stage failures are recorded on the returned result. Only failures to
    /// start the cycle or to record and publish it are returned as errors.
    pub async fn integrate(&self, request: IntegrationRequest) -> Result<IntegrationResult> {
        let _cycle = self.cycle_lock.lock().await;

        self.target
            .initialise_for_build(&request)
            .await
            .map_err(RunnerError::Initialise)?;
        let mut result = self.result_manager.start_new_integration(&request).await?;

        let span = IntegrationSpan::new(result.project_name(), &result.build_id().simple().to_string());
        self.run_cycle(&mut result)
            .instrument(span.span().clone())
            .await?;
        Ok(result)
    }

    async fn run_cycle(&self, result: &mut IntegrationResult) -> Result<()> {
        let build_values = result.integration_request().build_values().clone();
        result.parameters_mut().extend_from_map(&build_values);
        result.mark_start_time();
        result.generate_system_parameter_values();

        let request = result.integration_request();
        emit_integration_started(
            result.project_name(),
            request.build_condition(),
            request.source(),
        );

        create_directory(result.working_directory()).await?;
        create_directory(result.artifact_directory()).await?;

        let last = result.last_integration().clone();
        self.check_for_modifications(result, &last).await;

        if result.has_source_control_error()
            && result.integration_request().publish_on_source_control_exception()
        {
            let failure = result.source_control_error().cloned();
            result.set_exception_result(failure);
            result.keep_modification_boundary();
            self.complete(result).await?;
            self.target.set_activity(ProjectActivity::Sleeping);
            return Ok(());
        }

        let will_build = !result.has_source_control_error() && result.should_run_build();
        emit_modifications_checked(result.project_name(), result.modifications().len(), will_build);

        if will_build {
            if let Err(failure) = self.build(result, &last).await {
                emit_stage_failure(result.project_name(), "build", &failure);
                result.set_exception_result(Some(failure));
            }
            self.complete(result).await?;
        } else if result.has_source_control_error() || last.has_source_control_error {
            let status = if result.has_source_control_error() {
                result.last_build_status()
            } else {
                last.last_build_status
            };
            // Nothing was built, so changes since the last build stay pending.
            result.set_status(status);
            result.keep_modification_boundary();
            result.mark_end_time();
            self.result_manager.finish_integration(result).await?;
            emit_build_skipped(result.project_name(), status);
        } else {
            result.set_status(last.status);
            emit_build_skipped(result.project_name(), last.status);
        }

        self.target.set_activity(ProjectActivity::Sleeping);
        Ok(())
    }

    async fn check_for_modifications(&self, result: &mut IntegrationResult, last: &IntegrationSummary) {
        self.target.set_activity(ProjectActivity::CheckingModifications);
        self.target.record_source_control_operation(
            SourceControlOperation::CheckForModifications,
            ItemBuildStatus::Running,
        );

        let outcome = self
            .quiet_period
            .get_modifications(self.target.source_control(), last, result)
            .await;

        self.target.record_source_control_operation(
            SourceControlOperation::CheckForModifications,
            ItemBuildStatus::completed(outcome.is_ok()),
        );

        match outcome {
            Ok(modifications) => result.set_modifications(modifications),
            Err(failure) => {
                emit_source_control_failure(result.project_name(), &failure);
                result.set_source_control_error(Some(failure));
                result.set_last_build_status(last.last_real_status());
            }
        }
    }

    async fn build(&self, result: &mut IntegrationResult, last: &IntegrationSummary) -> BuildResult<()> {
        self.target.clear_not_needed_messages();

        let label_from = if last.status == IntegrationStatus::Exception {
            last.as_if_succeeded()
        } else {
            last.clone()
        };
        let label = self.target.create_label(&label_from).await?;
        result.set_label(label);
        result.generate_system_parameter_values();

        self.target.set_activity(ProjectActivity::Building);
        self.target.prebuild(result).await?;
        if result.failed() {
            return Ok(());
        }

        self.target.record_source_control_operation(
            SourceControlOperation::GetSource,
            ItemBuildStatus::Running,
        );
        let fetched = self.target.source_control().get_source(result).await;
        self.target.record_source_control_operation(
            SourceControlOperation::GetSource,
            ItemBuildStatus::completed(fetched.is_ok()),
        );
        fetched?;

        self.target.run(result).await?;
        self.target.source_control().label_source_control(result).await
    }

    async fn complete(&self, result: &mut IntegrationResult) -> Result<()> {
        result.mark_end_time();
        result.update_failure_attribution();
        self.result_manager.finish_integration(result).await?;
        self.target
            .publish_results(result)
            .await
            .map_err(RunnerError::Publish)?;
        emit_integration_completed(result);
        Ok(())
    }
}

async fn create_directory(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| RunnerError::Directory {
            path: path.to_path_buf(),
            source,
        })
}
