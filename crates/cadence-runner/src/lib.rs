//! Cadence Runner
//!
//! Orchestrates integration cycles: quiet period, labelling, build tasks,
//! source-control labelling, persistence and publishing.

pub mod error;
pub mod exec;
pub mod project;
pub mod publisher;
pub mod runner;
pub mod target;
pub mod task;

use std::sync::Arc;

use cadence_core::ProjectConfig;
use cadence_state::{FileStateStore, ProjectSettings, ResultManager};

pub use error::{Result, RunnerError};
pub use exec::ExecTask;
pub use project::Project;
pub use publisher::{IntegrationRecord, JsonLogPublisher, Publisher};
pub use runner::IntegrationRunner;
pub use target::IntegrationRunnerTarget;
pub use task::{LogTask, Task};

/// Everything needed to integrate one configured project.
pub struct ProjectRuntime {
    pub project: Arc<Project>,
    pub result_manager: Arc<ResultManager>,
    pub runner: IntegrationRunner,
}

impl ProjectRuntime {
    /// Wire a project to file-backed state under its state directory.
    pub fn from_config(config: ProjectConfig) -> Self {
        let store = Arc::new(FileStateStore::new(config.state_directory()));
        let result_manager = Arc::new(ResultManager::new(ProjectSettings::from(&config), store));
        let project = Arc::new(Project::from_config(config));
        let runner = IntegrationRunner::new(
            result_manager.clone(),
            project.clone(),
            Arc::new(project.quiet_period()),
        );
        Self {
            project,
            result_manager,
            runner,
        }
    }
}
