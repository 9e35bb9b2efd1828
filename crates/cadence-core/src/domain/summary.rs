//! Persisted snapshot of a completed cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::IntegrationStatus;

/// Label carried by a project that has never been integrated.
pub const INITIAL_LABEL: &str = "UNKNOWN";

/// Compact record of one past cycle, used to seed the next one.
///
/// The first four fields are the stable persisted shape. The remaining
/// fields carry failure attribution and source-control bookkeeping across
/// cycles and are only written when they hold something.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationSummary {
    pub status: IntegrationStatus,
    pub label: String,
    #[serde(default)]
    pub last_successful_label: Option<String>,
    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_source_control_error: bool,
    #[serde(default, skip_serializing_if = "is_unknown")]
    pub last_build_status: IntegrationStatus,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_unknown(status: &IntegrationStatus) -> bool {
    *status == IntegrationStatus::Unknown
}

impl IntegrationSummary {
    pub fn new(
        status: IntegrationStatus,
        label: impl Into<String>,
        last_successful_label: Option<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            label: label.into(),
            last_successful_label,
            start_time,
            failure_users: Vec::new(),
            failure_tasks: Vec::new(),
            has_source_control_error: false,
            last_build_status: IntegrationStatus::Unknown,
        }
    }

    /// The sentinel for "no prior cycle exists".
    pub fn initial() -> Self {
        Self::new(
            IntegrationStatus::Unknown,
            INITIAL_LABEL,
            None,
            DateTime::<Utc>::default(),
        )
    }

    pub fn is_initial(&self) -> bool {
        self.label == INITIAL_LABEL
    }

    /// Status of the last cycle that got past source control.
    pub fn last_real_status(&self) -> IntegrationStatus {
        if self.has_source_control_error {
            self.last_build_status
        } else {
            self.status
        }
    }

    /// A copy that claims success, keeping label and timing.
    pub fn as_if_succeeded(&self) -> Self {
        Self {
            status: IntegrationStatus::Success,
            ..self.clone()
        }
    }
}

impl Default for IntegrationSummary {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_summary() {
        let summary = IntegrationSummary::initial();
        assert!(summary.is_initial());
        assert_eq!(summary.status, IntegrationStatus::Unknown);
        assert_eq!(summary.label, "UNKNOWN");
        assert!(summary.last_successful_label.is_none());
    }

    #[test]
    fn test_non_initial_summary() {
        let summary = IntegrationSummary::new(IntegrationStatus::Success, "12", None, Utc::now());
        assert!(!summary.is_initial());
    }

    #[test]
    fn test_serialized_shape_omits_empty_extras() {
        let summary = IntegrationSummary::new(
            IntegrationStatus::Success,
            "build-3",
            Some("build-3".to_string()),
            Utc::now(),
        );
        let json = serde_json::to_value(&summary).expect("serialize");
        let obj = json.as_object().expect("object");

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["label", "last_successful_label", "start_time", "status"]
        );
    }

    #[test]
    fn test_deserialize_minimal_shape() {
        let json = r#"{"status":"Failure","label":"7","last_successful_label":"6","start_time":"2024-05-01T10:00:00Z"}"#;
        let summary: IntegrationSummary = serde_json::from_str(json).expect("deserialize");
        assert_eq!(summary.status, IntegrationStatus::Failure);
        assert!(summary.failure_users.is_empty());
        assert!(!summary.has_source_control_error);
    }

    #[test]
    fn test_last_real_status() {
        let mut summary = IntegrationSummary::new(IntegrationStatus::Success, "1", None, Utc::now());
        assert_eq!(summary.last_real_status(), IntegrationStatus::Success);

        summary.status = IntegrationStatus::Exception;
        summary.has_source_control_error = true;
        summary.last_build_status = IntegrationStatus::Failure;
        assert_eq!(summary.last_real_status(), IntegrationStatus::Failure);
    }

    #[test]
    fn test_as_if_succeeded_keeps_label() {
        let summary = IntegrationSummary::new(
            IntegrationStatus::Exception,
            "41",
            Some("40".to_string()),
            Utc::now(),
        );
        let fixed = summary.as_if_succeeded();
        assert_eq!(fixed.status, IntegrationStatus::Success);
        assert_eq!(fixed.label, "41");
        assert_eq!(fixed.last_successful_label.as_deref(), Some("40"));
    }
}
