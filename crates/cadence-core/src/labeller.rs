//! Build label generation.

use serde::{Deserialize, Serialize};

use crate::domain::{numeric_suffix, IntegrationStatus, IntegrationSummary};

/// Produces the label for the next cycle from the previous one.
pub trait Labeller: Send + Sync {
    fn generate(&self, last: &IntegrationSummary) -> String;
}

/// `<prefix><n>` labels with a monotonically increasing build number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultLabeller {
    pub prefix: String,
    pub initial_build_number: u32,
    /// Also advance the number after a failed cycle.
    pub increment_on_failure: bool,
}

impl Default for DefaultLabeller {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            initial_build_number: 1,
            increment_on_failure: false,
        }
    }
}

impl DefaultLabeller {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    fn should_increment(&self, last: &IntegrationSummary) -> bool {
        last.status == IntegrationStatus::Success || self.increment_on_failure
    }
}

impl Labeller for DefaultLabeller {
    fn generate(&self, last: &IntegrationSummary) -> String {
        if last.is_initial() {
            return format!("{}{}", self.prefix, self.initial_build_number);
        }
        if !self.should_increment(last) {
            return last.label.clone();
        }
        let next = numeric_suffix(&last.label)
            .saturating_add(1)
            .max(self.initial_build_number);
        format!("{}{}", self.prefix, next)
    }
}
