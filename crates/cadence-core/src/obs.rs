//! Structured lifecycle events for integration cycles.
//!
//! Every event carries an `event` field so log pipelines can filter on it.

use tracing::{info, warn};

use crate::domain::{BuildCondition, IntegrationResult, IntegrationStatus};

/// Project-scoped span for one cycle.
///
/// Async code attaches it with `tracing::Instrument`; synchronous sections
/// can hold the RAII guard returned by [`IntegrationSpan::enter`].
///
/// ```ignore
/// let span = IntegrationSpan::new("demo", &build_id);
/// run_cycle().instrument(span.span().clone()).await;
/// ```
#[derive(Debug, Clone)]
pub struct IntegrationSpan {
    span: tracing::Span,
}

impl IntegrationSpan {
    pub fn new(project: &str, build_id: &str) -> Self {
        Self {
            span: tracing::info_span!("cadence.integration", project = %project, build_id = %build_id),
        }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Enter the span until the guard is dropped.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

pub fn emit_integration_started(project: &str, condition: BuildCondition, source: &str) {
    info!(
        event = "integration.started",
        project = %project,
        condition = %condition,
        source = %source,
    );
}

pub fn emit_modifications_checked(project: &str, count: usize, will_build: bool) {
    info!(
        event = "integration.modifications_checked",
        project = %project,
        count = count,
        will_build = will_build,
    );
}

/// Source control could not be queried (warning level).
pub fn emit_source_control_failure(project: &str, error: &dyn std::fmt::Display) {
    warn!(event = "integration.source_control_failure", project = %project, error = %error);
}

pub fn emit_build_skipped(project: &str, status: IntegrationStatus) {
    info!(event = "integration.skipped", project = %project, status = %status);
}

/// A stage failed and was recorded on the result (warning level).
pub fn emit_stage_failure(project: &str, stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "integration.stage_failure", project = %project, stage = %stage, error = %error);
}

pub fn emit_integration_completed(result: &IntegrationResult) {
    let duration_ms = result
        .total_integration_time()
        .map(|d| d.num_milliseconds())
        .unwrap_or_default();
    info!(
        event = "integration.completed",
        project = %result.project_name(),
        label = %result.label(),
        status = %result.status(),
        duration_ms = duration_ms,
        tasks = result.task_results().len(),
    );
}
