//! Source-control changes detected for a cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single change reported by source control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modification {
    /// Change kind as reported by the provider (e.g. "modified", "added").
    #[serde(default)]
    pub modification_type: String,

    /// File name, if the provider reports per-file changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Folder containing the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,

    /// When the change was committed.
    pub modified_time: DateTime<Utc>,

    /// Author of the change.
    pub user_name: String,

    /// Provider-specific change identifier (revision, commit sha, changelist).
    pub change_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl Modification {
    pub fn new(
        user_name: impl Into<String>,
        change_number: impl Into<String>,
        modified_time: DateTime<Utc>,
    ) -> Self {
        Self {
            modification_type: "modified".to_string(),
            file_name: None,
            folder_name: None,
            modified_time,
            user_name: user_name.into(),
            change_number: change_number.into(),
            comment: None,
            email_address: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_file(mut self, folder: impl Into<String>, file: impl Into<String>) -> Self {
        self.folder_name = Some(folder.into());
        self.file_name = Some(file.into());
        self
    }
}

/// Identifier of the most recent change among `modifications`.
///
/// When every identifier is an integer the highest one wins. Otherwise
/// (commit hashes, mixed schemes) the change with the latest
/// `modified_time` wins. Returns `None` when there are no modifications.
pub fn last_change_number(modifications: &[Modification]) -> Option<String> {
    let candidates: Vec<&Modification> = modifications
        .iter()
        .filter(|m| !m.change_number.is_empty())
        .collect();

    let numeric: Option<Vec<u64>> = candidates
        .iter()
        .map(|m| m.change_number.parse::<u64>().ok())
        .collect();
    if let Some(numbers) = numeric {
        return numbers.into_iter().max().map(|n| n.to_string());
    }

    candidates
        .into_iter()
        .max_by_key(|m| m.modified_time)
        .map(|m| m.change_number.clone())
}
