//! Project configuration.
//!
//! A project is described by a TOML document. Pluggable parts (source
//! control, labeller, tasks, publishers) are closed tagged variants selected
//! by their `type` key:
//!
//! ```toml
//! name = "demo"
//!
//! [source_control]
//! type = "git"
//! tag_on_success = true
//!
//! [[tasks]]
//! type = "exec"
//! name = "build"
//! executable = "cargo"
//! args = ["build", "--release"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{CoreError, Result};
use crate::git::GitSourceControl;
use crate::labeller::DefaultLabeller;
use crate::property_path::{ConfigNode, ConfigValue};

pub const WORKING_DIR_ENV: &str = "CADENCE_WORKING_DIR";
pub const ARTIFACT_DIR_ENV: &str = "CADENCE_ARTIFACT_DIR";
pub const STATE_DIR_ENV: &str = "CADENCE_STATE_DIR";

const DEFAULT_TASK_TIMEOUT_SECS: u64 = 600;

/// Where a project's changes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceControlConfig {
    #[default]
    None,
    Git(GitSourceControl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabellerConfig {
    Default(DefaultLabeller),
}

impl Default for LabellerConfig {
    fn default() -> Self {
        LabellerConfig::Default(DefaultLabeller::default())
    }
}

/// An external command run as part of the build or as a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTaskConfig {
    /// Display name; defaults to the executable.
    #[serde(default)]
    pub name: Option<String>,
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Relative paths resolve against the cycle's working directory.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    #[serde(default = "default_task_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_task_timeout_secs() -> u64 {
    DEFAULT_TASK_TIMEOUT_SECS
}

impl ExecTaskConfig {
    pub fn new(executable: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: None,
            executable: executable.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: BTreeMap::new(),
            working_directory: None,
            timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.executable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskConfig {
    Exec(ExecTaskConfig),
    /// Records a fixed message in the build output.
    Log { name: Option<String>, message: String },
}

impl TaskConfig {
    pub fn name(&self) -> &str {
        match self {
            TaskConfig::Exec(exec) => exec.display_name(),
            TaskConfig::Log { name, .. } => name.as_deref().unwrap_or("log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublisherConfig {
    /// Write the cycle record as JSON into the build log directory.
    JsonLog {
        #[serde(default)]
        file_name: Option<String>,
    },
    Exec(ExecTaskConfig),
}

/// Top-level project document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub artifact_directory: Option<PathBuf>,
    #[serde(default)]
    pub state_directory: Option<PathBuf>,
    /// Seconds without new changes required before a cycle builds.
    #[serde(default)]
    pub modification_delay_secs: u64,
    #[serde(default)]
    pub source_control: SourceControlConfig,
    #[serde(default)]
    pub labeller: LabellerConfig,
    /// Run before source is fetched; a failure here skips the build tasks.
    #[serde(default)]
    pub prebuild: Vec<TaskConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub publishers: Vec<PublisherConfig>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            working_directory: None,
            artifact_directory: None,
            state_directory: None,
            modification_delay_secs: 0,
            source_control: SourceControlConfig::default(),
            labeller: LabellerConfig::default(),
            prebuild: Vec::new(),
            tasks: Vec::new(),
            publishers: Vec::new(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: ProjectConfig = toml::from_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace directories with values from `lookup` (normally the process
    /// environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(dir) = non_empty(WORKING_DIR_ENV) {
            self.working_directory = Some(dir);
        }
        if let Some(dir) = non_empty(ARTIFACT_DIR_ENV) {
            self.artifact_directory = Some(dir);
        }
        if let Some(dir) = non_empty(STATE_DIR_ENV) {
            self.state_directory = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "project name must not be empty".to_string(),
            ));
        }

        let execs = self
            .prebuild
            .iter()
            .chain(self.tasks.iter())
            .filter_map(|t| match t {
                TaskConfig::Exec(exec) => Some(exec),
                TaskConfig::Log { .. } => None,
            })
            .chain(self.publishers.iter().filter_map(|p| match p {
                PublisherConfig::Exec(exec) => Some(exec),
                PublisherConfig::JsonLog { .. } => None,
            }));
        for exec in execs {
            if exec.executable.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!(
                    "exec task '{}' has an empty command",
                    exec.display_name()
                )));
            }
            if exec.timeout_secs == 0 {
                return Err(CoreError::InvalidConfig(format!(
                    "exec task '{}' has a zero timeout",
                    exec.display_name()
                )));
            }
        }
        Ok(())
    }

    /// Working directory, defaulting to `<name>/WorkingDirectory`.
    pub fn working_directory(&self) -> PathBuf {
        self.working_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name).join("WorkingDirectory"))
    }

    /// Artifact directory, defaulting to `<name>/Artifacts`.
    pub fn artifact_directory(&self) -> PathBuf {
        self.artifact_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name).join("Artifacts"))
    }

    /// State directory, defaulting to the artifact directory.
    pub fn state_directory(&self) -> PathBuf {
        self.state_directory
            .clone()
            .unwrap_or_else(|| self.artifact_directory())
    }

    /// Build logs live under the artifact directory.
    pub fn build_log_directory(&self) -> PathBuf {
        self.artifact_directory().join("buildlogs")
    }
}

impl ConfigNode for ProjectConfig {
    fn field(&self, name: &str) -> Option<ConfigValue> {
        serde_json::to_value(self).ok()?.get(name).cloned()
    }
}
