//! Publishing of completed cycles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use cadence_core::config::PublisherConfig;
use cadence_core::{
    BuildCondition, BuildFailure, BuildResult, IntegrationResult, IntegrationStatus,
    Modification, NameValuePair, TaskResult,
};

use crate::exec::ExecTask;

pub const RECORD_SCHEMA_VERSION: &str = "1.0";

/// Exported snapshot of a completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrationRecord {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    pub build_id: Uuid,
    pub label: String,
    pub status: IntegrationStatus,
    pub last_status: IntegrationStatus,
    pub build_condition: BuildCondition,
    pub request_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    pub modifications: Vec<Modification>,
    pub task_results: Vec<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<BuildFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_control_error: Option<BuildFailure>,
    pub failure_users: Vec<String>,
    pub failure_tasks: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub parameters: Vec<NameValuePair>,
}

impl From<&IntegrationResult> for IntegrationRecord {
    fn from(result: &IntegrationResult) -> Self {
        let request = result.integration_request();
        Self {
            schema_version: RECORD_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            project: result.project_name().to_string(),
            project_url: result.project_url().map(str::to_string),
            build_id: result.build_id(),
            label: result.label().to_string(),
            status: result.status(),
            last_status: result.last_integration_status(),
            build_condition: result.build_condition(),
            request_source: request.source().to_string(),
            user: request.user_name().map(str::to_string),
            start_time: result.start_time(),
            end_time: result.end_time(),
            duration_ms: result.total_integration_time().map(|d| d.num_milliseconds()),
            modifications: result.modifications().to_vec(),
            task_results: result.task_results().to_vec(),
            exception: result.exception_result().cloned(),
            source_control_error: result.source_control_error().cloned(),
            failure_users: result.failure_users().to_vec(),
            failure_tasks: result.failure_tasks().to_vec(),
            properties: result
                .integration_properties()
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
            parameters: result.parameters().iter().cloned().collect(),
        }
    }
}

/// Write a record as pretty JSON, creating parent directories.
pub fn write_integration_record(path: &Path, record: &IntegrationRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(record).context("serialize integration record")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Hands a completed cycle to the outside world.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, result: &IntegrationResult) -> BuildResult<()>;
}

/// Writes an [`IntegrationRecord`] into the build log directory.
///
/// The default file name is `log<yyyyMMddHHmmss>_<label>.json`, or
/// `log<yyyyMMddHHmmss>.json` for broken cycles.
#[derive(Debug, Clone, Default)]
pub struct JsonLogPublisher {
    file_name: Option<String>,
}

impl JsonLogPublisher {
    pub fn new(file_name: Option<String>) -> Self {
        Self { file_name }
    }

    pub fn log_path(&self, result: &IntegrationResult) -> PathBuf {
        let dir = result
            .build_log_directory()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| result.base_from_artifacts_directory("buildlogs"));
        let file_name = self.file_name.clone().unwrap_or_else(|| {
            let stamp = result.start_time().format("%Y%m%d%H%M%S");
            if result.succeeded() {
                format!("log{stamp}_{}.json", result.label())
            } else {
                format!("log{stamp}.json")
            }
        });
        dir.join(file_name)
    }
}

#[async_trait]
impl Publisher for JsonLogPublisher {
    fn name(&self) -> &str {
        "json_log"
    }

    async fn publish(&self, result: &IntegrationResult) -> BuildResult<()> {
        let path = self.log_path(result);
        let record = IntegrationRecord::from(result);
        write_integration_record(&path, &record)
            .map_err(|e| BuildFailure::publish(format!("{e:#}")))?;
        info!(project = %result.project_name(), path = %path.display(), "Wrote build log");
        Ok(())
    }
}

#[async_trait]
impl Publisher for ExecTask {
    fn name(&self) -> &str {
        ExecTask::name(self)
    }

    async fn publish(&self, result: &IntegrationResult) -> BuildResult<()> {
        let outcome = self
            .execute(result.parameters(), result.working_directory())
            .await?;
        if outcome.check_if_success() {
            Ok(())
        } else {
            Err(BuildFailure::publish(format!(
                "publisher {} failed: {}",
                ExecTask::name(self),
                outcome.data.trim()
            )))
        }
    }
}

pub fn build_publisher(config: &PublisherConfig) -> Box<dyn Publisher> {
    match config {
        PublisherConfig::JsonLog { file_name } => Box::new(JsonLogPublisher::new(file_name.clone())),
        PublisherConfig::Exec(exec) => Box::new(ExecTask::new(exec.clone())),
    }
}
