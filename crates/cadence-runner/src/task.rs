//! Build tasks.

use async_trait::async_trait;
use tracing::debug;

use cadence_core::config::TaskConfig;
use cadence_core::{apply_dynamic_values, BuildResult, IntegrationResult, TaskResult};

use crate::exec::ExecTask;

/// One step of a project's build.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// Run the step and record its outcome on `result`.
    async fn run(&self, result: &mut IntegrationResult) -> BuildResult<()>;
}

#[async_trait]
impl Task for ExecTask {
    fn name(&self) -> &str {
        ExecTask::name(self)
    }

    async fn run(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        let outcome = self
            .execute(result.parameters(), result.working_directory())
            .await?;
        if !outcome.check_if_success() {
            result.add_failure_task(self.name());
        }
        result.add_task_result(outcome);
        Ok(())
    }
}

/// Adds a fixed message to the build output.
#[derive(Debug, Clone)]
pub struct LogTask {
    name: String,
    message: String,
}

impl LogTask {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Task for LogTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        let message = apply_dynamic_values(&self.message, result.parameters());
        debug!(task = %self.name, message = %message, "Log task");
        result.add_task_result(TaskResult::success(&self.name, message));
        Ok(())
    }
}

pub fn build_task(config: &TaskConfig) -> Box<dyn Task> {
    match config {
        TaskConfig::Exec(exec) => Box::new(ExecTask::new(exec.clone())),
        TaskConfig::Log { message, .. } => Box::new(LogTask::new(config.name(), message.clone())),
    }
}

/// Run `tasks` in order, stopping at the first one that breaks the build.
pub async fn run_tasks(tasks: &[Box<dyn Task>], result: &mut IntegrationResult) -> BuildResult<()> {
    for (index, task) in tasks.iter().enumerate() {
        if result.status().is_broken() {
            debug!(
                project = %result.project_name(),
                skipped = tasks.len() - index,
                "Skipping remaining tasks after failure"
            );
            break;
        }
        task.run(result).await?;
    }
    Ok(())
}
