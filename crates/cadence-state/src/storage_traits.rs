//! Storage trait definitions for Cadence
//!
//! - `StateStore`: keyed persistence of the last `IntegrationSummary`
//! - `IntegrationResultManager`: starts and finishes cycles for one project
//!
//! Both are async and backend-agnostic. In-memory fakes live in `fakes`.

use async_trait::async_trait;

use cadence_core::{IntegrationRequest, IntegrationResult, IntegrationSummary};

use crate::error::StateError;

/// Result type for state operations
pub type StateResult<T> = std::result::Result<T, StateError>;

/// Persistence of the last completed cycle per project.
///
/// Guarantees:
/// - `load` returns `None` for a project that was never saved.
/// - `load` after `save` returns an equal summary.
/// - `save` replaces the previous summary in full.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, project: &str) -> StateResult<Option<IntegrationSummary>>;

    async fn save(&self, project: &str, summary: &IntegrationSummary) -> StateResult<()>;

    /// Forget a project's state. Deleting a missing project is not an error.
    async fn delete(&self, project: &str) -> StateResult<()>;
}

/// Hands out per-cycle results and records completed cycles.
#[async_trait]
pub trait IntegrationResultManager: Send + Sync {
    /// Summary of the last completed cycle, or the initial sentinel.
    async fn last_integration(&self) -> StateResult<IntegrationSummary>;

    /// A fresh result seeded from the last completed cycle.
    async fn start_new_integration(
        &self,
        request: &IntegrationRequest,
    ) -> StateResult<IntegrationResult>;

    /// Record `result` as the last completed cycle.
    async fn finish_integration(&self, result: &IntegrationResult) -> StateResult<()>;
}
