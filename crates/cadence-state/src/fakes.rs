//! In-memory fakes for storage traits (testing only)

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use cadence_core::IntegrationSummary;

use crate::storage_traits::{StateResult, StateStore};

/// In-memory state store backed by a `HashMap<project, summary>`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    summaries: Mutex<HashMap<String, IntegrationSummary>>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `summary` for `project`.
    pub fn with_summary(project: &str, summary: IntegrationSummary) -> Self {
        let store = Self::new();
        store
            .summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.to_string(), summary);
        store
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, project: &str) -> StateResult<Option<IntegrationSummary>> {
        let summaries = self.summaries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(summaries.get(project).cloned())
    }

    async fn save(&self, project: &str, summary: &IntegrationSummary) -> StateResult<()> {
        self.summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.to_string(), summary.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    async fn delete(&self, project: &str) -> StateResult<()> {
        self.summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project);
        Ok(())
    }
}
