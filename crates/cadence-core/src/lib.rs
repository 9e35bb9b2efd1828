//! Cadence Core Library
//!
//! Domain model and pluggable capabilities for continuous-integration
//! cycles: results and summaries, quiet periods, labelling, source control,
//! project configuration and property paths.

pub mod config;
pub mod domain;
pub mod dynamic_values;
pub mod git;
pub mod labeller;
pub mod obs;
pub mod property_path;
pub mod quiet_period;
pub mod source_control;
pub mod telemetry;

pub use config::{
    ExecTaskConfig, LabellerConfig, ProjectConfig, PublisherConfig, SourceControlConfig,
    TaskConfig,
};
pub use domain::{
    numeric_suffix, BuildCondition, BuildFailure, BuildResult, CoreError, IntegrationProperties,
    IntegrationRequest, IntegrationResult, IntegrationStatus, IntegrationSummary, ItemBuildStatus,
    Modification, NameValuePair, ParameterList, ProjectActivity, PropertyValue, Result,
    SourceControlOperation, TaskResult, INITIAL_LABEL,
};
pub use dynamic_values::{apply_dynamic_values, find_dynamic_values, DynamicValue};
pub use git::{capture_head_sha, is_git_repo, GitSourceControl};
pub use labeller::{DefaultLabeller, Labeller};
pub use property_path::{ConfigNode, ConfigValue, PathSegment, PropertyPath};
pub use quiet_period::{DefaultQuietPeriod, QuietPeriod};
pub use source_control::{NullSourceControl, SourceControl};
pub use telemetry::init_tracing;

/// Crate version, for CLI banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
