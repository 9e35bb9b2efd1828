//! Externally visible integration properties.
//!
//! The key names below are a public contract: downstream reporting and the
//! `$`-prefixed build parameters handed to tasks depend on them.

use std::collections::BTreeMap;
use std::fmt;

use super::status::{BuildCondition, IntegrationStatus};

pub const PROJECT: &str = "CCNetProject";
pub const PROJECT_URL: &str = "CCNetProjectUrl";
pub const WORKING_DIRECTORY: &str = "CCNetWorkingDirectory";
pub const ARTIFACT_DIRECTORY: &str = "CCNetArtifactDirectory";
pub const INTEGRATION_STATUS: &str = "CCNetIntegrationStatus";
pub const LABEL: &str = "CCNetLabel";
pub const BUILD_CONDITION: &str = "CCNetBuildCondition";
pub const NUMERIC_LABEL: &str = "CCNetNumericLabel";
pub const BUILD_DATE: &str = "CCNetBuildDate";
pub const BUILD_TIME: &str = "CCNetBuildTime";
pub const LAST_INTEGRATION_STATUS: &str = "CCNetLastIntegrationStatus";
pub const LISTENER_FILE: &str = "CCNetListenerFile";
pub const FAILURE_USERS: &str = "CCNetFailureUsers";
pub const FAILURE_TASKS: &str = "CCNetFailureTasks";
pub const MODIFYING_USERS: &str = "CCNetModifyingUsers";
pub const USER: &str = "CCNetUser";
pub const BUILD_ID: &str = "CCNetBuildId";
pub const LAST_CHANGE_NUMBER: &str = "LastChangeNumber";
pub const REQUEST_SOURCE: &str = "CCNetRequestSource";

/// Marker prepended to property names when they become build parameters.
pub const PARAMETER_SIGIL: char = '$';

/// Typed value of an integration property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Number(i64),
    Status(IntegrationStatus),
    Condition(BuildCondition),
    List(Vec<String>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Status(s) => write!(f, "{s}"),
            PropertyValue::Condition(c) => write!(f, "{c}"),
            PropertyValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

/// Sorted property map, keyed by contract name.
pub type IntegrationProperties = BTreeMap<String, PropertyValue>;

/// Build-parameter name for a property key (`CCNetLabel` -> `$CCNetLabel`).
pub fn parameter_name(property: &str) -> String {
    format!("{PARAMETER_SIGIL}{property}")
}
