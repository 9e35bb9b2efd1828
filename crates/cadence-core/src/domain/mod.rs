//! Domain model for integration cycles.
//!
//! Leaf value types first (status, modification, request, summary), then the
//! per-cycle aggregate [`IntegrationResult`].

pub mod error;
pub mod modification;
pub mod parameters;
pub mod properties;
pub mod request;
pub mod result;
pub mod status;
pub mod summary;
pub mod task_result;

pub use error::{BuildFailure, BuildResult, CoreError, Result};
pub use modification::{last_change_number, Modification};
pub use parameters::{NameValuePair, ParameterList};
pub use properties::{IntegrationProperties, PropertyValue};
pub use request::IntegrationRequest;
pub use result::{numeric_suffix, IntegrationResult};
pub use status::{
    BuildCondition, IntegrationStatus, ItemBuildStatus, ProjectActivity, SourceControlOperation,
};
pub use summary::{IntegrationSummary, INITIAL_LABEL};
pub use task_result::TaskResult;
