use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use cadence_core::IntegrationSummary;

use crate::error::StateError;
use crate::storage_traits::{StateResult, StateStore};

const STATE_SUFFIX: &str = ".state.json";

/// Filesystem-backed state store.
///
/// Layout: `<root>/<project>.state.json`, one pretty-printed summary per file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the state file for `project`.
    pub fn state_path(&self, project: &str) -> StateResult<PathBuf> {
        let file_stem: String = project
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let file_stem = file_stem.trim();
        if file_stem.is_empty() || file_stem.chars().all(|c| c == '.') {
            return Err(StateError::InvalidProject(project.to_string()));
        }
        Ok(self.root.join(format!("{file_stem}{STATE_SUFFIX}")))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, project: &str) -> StateResult<Option<IntegrationSummary>> {
        let path = self.state_path(project)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let summary = serde_json::from_slice(&bytes).map_err(|e| StateError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!(project = %project, path = %path.display(), "Loaded integration state");
        Ok(Some(summary))
    }

    async fn save(&self, project: &str, summary: &IntegrationSummary) -> StateResult<()> {
        let path = self.state_path(project)?;
        fs::create_dir_all(&self.root)?;

        let json = serde_json::to_vec_pretty(summary)?;

        // Atomic write: temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| StateError::Persist {
            path: path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(project = %project, path = %path.display(), "Saved integration state");
        Ok(())
    }

    async fn delete(&self, project: &str) -> StateResult<()> {
        let path = self.state_path(project)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
