//! Integration requests: why a cycle was triggered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::status::BuildCondition;

/// Describes the trigger for an integration cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationRequest {
    build_condition: BuildCondition,
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default)]
    build_values: BTreeMap<String, String>,
    #[serde(default)]
    publish_on_source_control_exception: bool,
}

impl IntegrationRequest {
    pub fn new(
        build_condition: BuildCondition,
        source: impl Into<String>,
        user_name: Option<String>,
    ) -> Self {
        Self {
            build_condition,
            source: source.into(),
            user_name,
            build_values: BTreeMap::new(),
            publish_on_source_control_exception: false,
        }
    }

    /// The sentinel used when no explicit request exists.
    pub fn null_request() -> Self {
        Self::new(BuildCondition::NoBuild, "", None)
    }

    pub fn is_null(&self) -> bool {
        self == &Self::null_request()
    }

    /// Attach trigger-supplied build values.
    pub fn with_build_values(mut self, values: BTreeMap<String, String>) -> Self {
        self.build_values = values;
        self
    }

    /// Publish results even when modification detection fails.
    pub fn with_publish_on_source_control_exception(mut self, publish: bool) -> Self {
        self.publish_on_source_control_exception = publish;
        self
    }

    pub fn build_condition(&self) -> BuildCondition {
        self.build_condition
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn build_values(&self) -> &BTreeMap<String, String> {
        &self.build_values
    }

    pub fn publish_on_source_control_exception(&self) -> bool {
        self.publish_on_source_control_exception
    }

    /// Same trigger, but forced. Used for the first cycle of a project.
    pub(crate) fn forced(&self) -> Self {
        Self {
            build_condition: BuildCondition::ForceBuild,
            ..self.clone()
        }
    }

    pub(crate) fn set_build_value(&mut self, key: String, value: String) {
        self.build_values.insert(key, value);
    }
}

impl Default for IntegrationRequest {
    fn default() -> Self {
        Self::null_request()
    }
}

impl fmt::Display for IntegrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_name {
            Some(user) => write!(
                f,
                "{} triggered a build ({}) from {}",
                user, self.build_condition, self.source
            ),
            None => write!(f, "{} triggered a build ({})", self.source, self.build_condition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_request() {
        let request = IntegrationRequest::null_request();
        assert!(request.is_null());
        assert_eq!(request.build_condition(), BuildCondition::NoBuild);
        assert!(request.build_values().is_empty());
    }

    #[test]
    fn test_forced_keeps_source_and_values() {
        let mut values = BTreeMap::new();
        values.insert("target".to_string(), "release".to_string());
        let request = IntegrationRequest::new(
            BuildCondition::IfModificationExists,
            "interval trigger",
            Some("alice".to_string()),
        )
        .with_build_values(values.clone());

        let forced = request.forced();
        assert_eq!(forced.build_condition(), BuildCondition::ForceBuild);
        assert_eq!(forced.source(), "interval trigger");
        assert_eq!(forced.user_name(), Some("alice"));
        assert_eq!(forced.build_values(), &values);
    }

    #[test]
    fn test_display() {
        let request =
            IntegrationRequest::new(BuildCondition::ForceBuild, "cli", Some("bob".to_string()));
        assert_eq!(request.to_string(), "bob triggered a build (ForceBuild) from cli");

        let request = IntegrationRequest::new(BuildCondition::IfModificationExists, "timer", None);
        assert_eq!(request.to_string(), "timer triggered a build (IfModificationExists)");
    }
}
