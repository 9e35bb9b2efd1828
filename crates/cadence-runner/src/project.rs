//! A configured project, usable as an [`IntegrationRunnerTarget`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use cadence_core::config::{LabellerConfig, ProjectConfig, SourceControlConfig};
use cadence_core::{
    BuildFailure, BuildResult, DefaultQuietPeriod, IntegrationRequest, IntegrationResult,
    IntegrationStatus, IntegrationSummary, ItemBuildStatus, Labeller, NullSourceControl,
    ProjectActivity, SourceControl, SourceControlOperation,
};

use crate::publisher::{build_publisher, Publisher};
use crate::target::IntegrationRunnerTarget;
use crate::task::{build_task, run_tasks, Task};

/// Runtime form of a [`ProjectConfig`].
pub struct Project {
    config: ProjectConfig,
    source_control: Arc<dyn SourceControl>,
    labeller: Box<dyn Labeller>,
    prebuild: Vec<Box<dyn Task>>,
    tasks: Vec<Box<dyn Task>>,
    publishers: Vec<Box<dyn Publisher>>,
    activity: Mutex<ProjectActivity>,
    messages: Mutex<Vec<String>>,
    operations: Mutex<Vec<(SourceControlOperation, ItemBuildStatus)>>,
}

impl Project {
    pub fn from_config(config: ProjectConfig) -> Self {
        let source_control: Arc<dyn SourceControl> = match &config.source_control {
            SourceControlConfig::None => Arc::new(NullSourceControl),
            SourceControlConfig::Git(git) => Arc::new(git.clone()),
        };
        Self::with_source_control(config, source_control)
    }

    /// Use `source_control` instead of the configured one.
    pub fn with_source_control(config: ProjectConfig, source_control: Arc<dyn SourceControl>) -> Self {
        let labeller: Box<dyn Labeller> = match &config.labeller {
            LabellerConfig::Default(labeller) => Box::new(labeller.clone()),
        };
        let prebuild = config.prebuild.iter().map(build_task).collect();
        let tasks = config.tasks.iter().map(build_task).collect();
        let publishers = config.publishers.iter().map(build_publisher).collect();

        Self {
            config,
            source_control,
            labeller,
            prebuild,
            tasks,
            publishers,
            activity: Mutex::new(ProjectActivity::Sleeping),
            messages: Mutex::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn quiet_period(&self) -> DefaultQuietPeriod {
        DefaultQuietPeriod::new(Duration::from_secs(self.config.modification_delay_secs))
    }

    pub fn activity(&self) -> ProjectActivity {
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Status messages describing the last broken cycle.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Source-control progress reported during the current cycle.
    pub fn source_control_operations(&self) -> Vec<(SourceControlOperation, ItemBuildStatus)> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_breakers(&self, result: &IntegrationResult) {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        if !result.failure_users().is_empty() {
            messages.push(format!("Breakers: {}", result.failure_users().join(", ")));
        }
        if !result.failure_tasks().is_empty() {
            messages.push(format!("Failing Tasks: {}", result.failure_tasks().join(", ")));
        }
    }
}

#[async_trait]
impl IntegrationRunnerTarget for Project {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn source_control(&self) -> &dyn SourceControl {
        self.source_control.as_ref()
    }

    async fn initialise_for_build(&self, request: &IntegrationRequest) -> BuildResult<()> {
        self.config
            .validate()
            .map_err(|e| BuildFailure::configuration(e.to_string()))?;
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!(project = %self.config.name, request = %request, "Initialised for build");
        Ok(())
    }

    async fn create_label(&self, last: &IntegrationSummary) -> BuildResult<String> {
        Ok(self.labeller.generate(last))
    }

    async fn prebuild(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        run_tasks(&self.prebuild, result).await
    }

    async fn run(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        run_tasks(&self.tasks, result).await?;
        if result.status() == IntegrationStatus::Unknown {
            result.set_status(IntegrationStatus::Success);
        }
        Ok(())
    }

    async fn publish_results(&self, result: &IntegrationResult) -> BuildResult<()> {
        if result.status().is_broken() {
            self.record_breakers(result);
        }

        let mut failure: Option<BuildFailure> = None;
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(result).await {
                debug!(publisher = %publisher.name(), error = %e, "Publisher failed");
                failure = Some(match failure {
                    Some(existing) => existing.combine(e),
                    None => e,
                });
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn clear_not_needed_messages(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn set_activity(&self, activity: ProjectActivity) {
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner) = activity;
    }

    fn record_source_control_operation(
        &self,
        operation: SourceControlOperation,
        status: ItemBuildStatus,
    ) {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((operation, status));
    }
}
