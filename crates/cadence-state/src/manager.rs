//! Per-project result manager backed by a [`StateStore`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use cadence_core::{IntegrationRequest, IntegrationResult, IntegrationSummary};

use crate::storage_traits::{IntegrationResultManager, StateResult, StateStore};

/// Identity and directories of the project a manager serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub name: String,
    pub url: Option<String>,
    pub working_directory: PathBuf,
    pub artifact_directory: PathBuf,
    pub build_log_directory: Option<PathBuf>,
}

impl ProjectSettings {
    pub fn new(
        name: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        artifact_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            url: None,
            working_directory: working_directory.into(),
            artifact_directory: artifact_directory.into(),
            build_log_directory: None,
        }
    }
}

impl From<&cadence_core::ProjectConfig> for ProjectSettings {
    fn from(config: &cadence_core::ProjectConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            working_directory: config.working_directory(),
            artifact_directory: config.artifact_directory(),
            build_log_directory: Some(config.build_log_directory()),
        }
    }
}

/// Reads the last summary once per cycle and writes it once on completion.
///
/// The loaded summary is cached; `finish_integration` refreshes the cache
/// only after the store accepted the new summary.
pub struct ResultManager {
    project: ProjectSettings,
    store: Arc<dyn StateStore>,
    cached: Mutex<Option<IntegrationSummary>>,
}

impl ResultManager {
    pub fn new(project: ProjectSettings, store: Arc<dyn StateStore>) -> Self {
        Self {
            project,
            store,
            cached: Mutex::new(None),
        }
    }

    pub fn project(&self) -> &ProjectSettings {
        &self.project
    }
}

#[async_trait]
impl IntegrationResultManager for ResultManager {
    async fn last_integration(&self) -> StateResult<IntegrationSummary> {
        let mut cached = self.cached.lock().await;
        if let Some(summary) = cached.as_ref() {
            return Ok(summary.clone());
        }

        let summary = self
            .store
            .load(&self.project.name)
            .await?
            .unwrap_or_else(IntegrationSummary::initial);
        debug!(
            project = %self.project.name,
            label = %summary.label,
            status = %summary.status,
            "Loaded last integration"
        );
        *cached = Some(summary.clone());
        Ok(summary)
    }

    async fn start_new_integration(
        &self,
        request: &IntegrationRequest,
    ) -> StateResult<IntegrationResult> {
        let last = self.last_integration().await?;
        let mut result = IntegrationResult::new(
            self.project.name.clone(),
            self.project.working_directory.clone(),
            self.project.artifact_directory.clone(),
            request.clone(),
            last,
        );
        result.set_project_url(self.project.url.clone());
        result.set_build_log_directory(self.project.build_log_directory.clone());
        Ok(result)
    }

    async fn finish_integration(&self, result: &IntegrationResult) -> StateResult<()> {
        let summary = result.to_summary();
        self.store.save(&self.project.name, &summary).await?;
        info!(
            project = %self.project.name,
            label = %summary.label,
            status = %summary.status,
            "Recorded integration"
        );
        *self.cached.lock().await = Some(summary);
        Ok(())
    }
}
