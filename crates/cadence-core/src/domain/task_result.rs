//! Output of individual pipeline tasks.

use serde::{Deserialize, Serialize};

/// Result recorded by one task of the build pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskResult {
    /// Name of the task that produced this result, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,

    /// Output captured from the task.
    pub data: String,

    /// Whether the task reported success.
    pub succeeded: bool,

    /// Exit code, for process-backed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl TaskResult {
    /// Plain data that always counts as a success.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            task_name: None,
            data: data.into(),
            succeeded: true,
            exit_code: None,
            duration_ms: 0,
        }
    }

    pub fn success(task_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            task_name: Some(task_name.into()),
            ..Self::data(data)
        }
    }

    pub fn failure(task_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            task_name: Some(task_name.into()),
            succeeded: false,
            ..Self::data(data)
        }
    }

    /// Result of a process: success iff the exit code is zero.
    pub fn from_process(
        task_name: impl Into<String>,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        duration_ms: u64,
    ) -> Self {
        let mut data = String::with_capacity(stdout.len() + stderr.len());
        data.push_str(stdout);
        data.push_str(stderr);
        Self {
            task_name: Some(task_name.into()),
            data,
            succeeded: exit_code == 0,
            exit_code: Some(exit_code),
            duration_ms,
        }
    }

    pub fn check_if_success(&self) -> bool {
        self.succeeded
    }
}
