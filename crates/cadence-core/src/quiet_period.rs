//! Quiet-period policy: wait for change activity to settle before building.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::{BuildResult, IntegrationResult, IntegrationSummary, Modification};
use crate::source_control::SourceControl;

/// Decides which modifications a cycle should act on.
#[async_trait]
pub trait QuietPeriod: Send + Sync {
    /// Fetch modifications between `from` and `to`, returning none while
    /// changes are still arriving. Source-control failures propagate.
    async fn get_modifications(
        &self,
        source_control: &dyn SourceControl,
        from: &IntegrationSummary,
        to: &IntegrationResult,
    ) -> BuildResult<Vec<Modification>>;
}

/// Defers a cycle while any change is younger than `modification_delay`.
///
/// A zero delay disables the quiet period.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQuietPeriod {
    modification_delay: Duration,
}

impl DefaultQuietPeriod {
    pub fn new(modification_delay: Duration) -> Self {
        Self { modification_delay }
    }

    pub fn modification_delay(&self) -> Duration {
        self.modification_delay
    }

    fn is_settled(&self, modifications: &[Modification], to: &IntegrationResult) -> bool {
        let Some(latest) = modifications.iter().map(|m| m.modified_time).max() else {
            return true;
        };
        let Ok(delay) = chrono::Duration::from_std(self.modification_delay) else {
            return false;
        };
        latest + delay <= to.start_time()
    }
}

#[async_trait]
impl QuietPeriod for DefaultQuietPeriod {
    async fn get_modifications(
        &self,
        source_control: &dyn SourceControl,
        from: &IntegrationSummary,
        to: &IntegrationResult,
    ) -> BuildResult<Vec<Modification>> {
        let modifications = source_control.get_modifications(from, to).await?;
        if self.modification_delay.is_zero() || self.is_settled(&modifications, to) {
            return Ok(modifications);
        }

        debug!(
            project = %to.project_name(),
            pending = modifications.len(),
            delay_secs = self.modification_delay.as_secs(),
            "Changes still arriving; deferring integration"
        );
        Ok(Vec::new())
    }
}
