//! External command execution for tasks and publishers.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use cadence_core::config::ExecTaskConfig;
use cadence_core::domain::properties::PARAMETER_SIGIL;
use cadence_core::{apply_dynamic_values, BuildFailure, BuildResult, ParameterList, TaskResult};

/// Runs one configured command.
///
/// Build parameters are exported to the child's environment (without the
/// `$` sigil) and `$[name|default]` placeholders in the executable,
/// arguments and configured environment are substituted first.
#[derive(Debug, Clone)]
pub struct ExecTask {
    config: ExecTaskConfig,
}

impl ExecTask {
    pub fn new(config: ExecTaskConfig) -> Self {
        Self { config }
    }

    pub fn name(&self) -> &str {
        self.config.display_name()
    }

    pub fn config(&self) -> &ExecTaskConfig {
        &self.config
    }

    fn resolve_directory(&self, base: &Path) -> PathBuf {
        match &self.config.working_directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }

    /// Execute the command. A non-zero exit or a timeout yields a failed
    /// [`TaskResult`]; only a command that cannot be started is an error.
    pub async fn execute(
        &self,
        parameters: &ParameterList,
        working_directory: &Path,
    ) -> BuildResult<TaskResult> {
        let start = Instant::now();
        let name = self.name().to_string();

        let executable = apply_dynamic_values(&self.config.executable, parameters);
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| apply_dynamic_values(arg, parameters))
            .collect();
        let directory = self.resolve_directory(working_directory);

        let mut command = Command::new(&executable);
        command
            .args(&args)
            .current_dir(&directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for parameter in parameters {
            let key = parameter.name.trim_start_matches(PARAMETER_SIGIL);
            if is_valid_env_key(key) {
                command.env(key, &parameter.value);
            }
        }
        for (key, value) in &self.config.env {
            command.env(key, apply_dynamic_values(value, parameters));
        }

        debug!(task = %name, executable = %executable, args = ?args, dir = %directory.display(), "Starting task");
        let child = command.spawn().map_err(|e| {
            BuildFailure::task(&name, format!("failed to start '{executable}': {e}"))
        })?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| BuildFailure::task(&name, e.to_string()))?,
            Err(_) => {
                warn!(task = %name, timeout_secs = self.config.timeout_secs, "Task timed out");
                let mut result = TaskResult::failure(
                    &name,
                    format!(
                        "Task {name} timed out after {} seconds",
                        self.config.timeout_secs
                    ),
                );
                result.duration_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        debug!(task = %name, exit_code, duration_ms, "Task finished");
        Ok(TaskResult::from_process(
            name,
            exit_code,
            &stdout,
            &stderr,
            duration_ms,
        ))
    }
}

fn is_valid_env_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c: char| c == '=' || c == '\0')
}
