//! The record of one integration cycle.
//!
//! An [`IntegrationResult`] is created once per cycle from the triggering
//! request and the previous cycle's [`IntegrationSummary`], mutated while the
//! cycle runs, and distilled back into a summary when the cycle completes.

use chrono::{DateTime, Duration, Local, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::error::BuildFailure;
use super::modification::{last_change_number, Modification};
use super::parameters::ParameterList;
use super::properties::{self, IntegrationProperties, PropertyValue};
use super::request::IntegrationRequest;
use super::status::{BuildCondition, IntegrationStatus};
use super::summary::{IntegrationSummary, INITIAL_LABEL};
use super::task_result::TaskResult;

/// Full, mutable record of a single integration cycle.
#[derive(Debug, Clone)]
pub struct IntegrationResult {
    project_name: String,
    project_url: Option<String>,
    working_directory: PathBuf,
    artifact_directory: PathBuf,
    build_log_directory: Option<PathBuf>,
    build_id: Uuid,

    request: IntegrationRequest,
    last_integration: IntegrationSummary,
    parameters: ParameterList,
    source_control_data: ParameterList,

    status: IntegrationStatus,
    label: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    /// Start time persisted in place of `start_time` when the cycle did not
    /// consume the changes it could have seen.
    modification_boundary: Option<DateTime<Utc>>,
    modifications: Vec<Modification>,
    exception: Option<BuildFailure>,
    task_results: Vec<TaskResult>,
    failure_users: Vec<String>,
    failure_tasks: Vec<String>,
    source_control_error: Option<BuildFailure>,
    has_source_control_error: bool,
    last_build_status: IntegrationStatus,
}

impl IntegrationResult {
    /// Start a result for a new cycle.
    ///
    /// When `last_integration` is the initial sentinel the request is
    /// replaced by a forced copy so the first cycle always builds. Failure
    /// attribution is copied from the previous cycle when it was broken.
    pub fn new(
        project_name: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        artifact_directory: impl Into<PathBuf>,
        request: IntegrationRequest,
        last_integration: IntegrationSummary,
    ) -> Self {
        let request = if last_integration.is_initial() {
            request.forced()
        } else {
            request
        };

        let (failure_users, failure_tasks) = if last_integration.status.is_broken() {
            (
                last_integration.failure_users.clone(),
                last_integration.failure_tasks.clone(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let label = if last_integration.label.is_empty() {
            INITIAL_LABEL.to_string()
        } else {
            last_integration.label.clone()
        };

        Self {
            project_name: project_name.into(),
            project_url: None,
            working_directory: working_directory.into(),
            artifact_directory: artifact_directory.into(),
            build_log_directory: None,
            build_id: Uuid::new_v4(),
            request,
            last_integration,
            parameters: ParameterList::new(),
            source_control_data: ParameterList::new(),
            status: IntegrationStatus::Unknown,
            label,
            start_time: Utc::now(),
            end_time: None,
            modification_boundary: None,
            modifications: Vec::new(),
            exception: None,
            task_results: Vec::new(),
            failure_users,
            failure_tasks,
            source_control_error: None,
            has_source_control_error: false,
            last_build_status: IntegrationStatus::Unknown,
        }
    }

    /// A result standing in for a project that has never been integrated.
    pub fn create_initial(
        project_name: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        artifact_directory: impl Into<PathBuf>,
    ) -> Self {
        let request = IntegrationRequest::new(BuildCondition::ForceBuild, "Initial Build", None);
        let mut result = Self::new(
            project_name,
            working_directory,
            artifact_directory,
            request,
            IntegrationSummary::initial(),
        );
        let now = Utc::now();
        result.start_time = now - Duration::days(1);
        result.end_time = Some(now);
        result
    }

    // -- identity ---------------------------------------------------------

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_url(&self) -> Option<&str> {
        self.project_url.as_deref()
    }

    pub fn set_project_url(&mut self, url: Option<String>) {
        self.project_url = url;
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn artifact_directory(&self) -> &Path {
        &self.artifact_directory
    }

    pub fn build_log_directory(&self) -> Option<&Path> {
        self.build_log_directory.as_deref()
    }

    pub fn set_build_log_directory(&mut self, dir: Option<PathBuf>) {
        self.build_log_directory = dir;
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    // -- construction inputs ----------------------------------------------

    pub fn integration_request(&self) -> &IntegrationRequest {
        &self.request
    }

    pub fn build_condition(&self) -> BuildCondition {
        self.request.build_condition()
    }

    pub fn last_integration(&self) -> &IntegrationSummary {
        &self.last_integration
    }

    pub fn last_integration_status(&self) -> IntegrationStatus {
        self.last_integration.status
    }

    pub fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }

    /// Provider-specific source-control data.
    pub fn source_control_data(&self) -> &ParameterList {
        &self.source_control_data
    }

    pub fn source_control_data_mut(&mut self) -> &mut ParameterList {
        &mut self.source_control_data
    }

    // -- status -----------------------------------------------------------

    pub fn status(&self) -> IntegrationStatus {
        self.status
    }

    pub fn set_status(&mut self, status: IntegrationStatus) {
        self.status = status;
    }

    pub fn succeeded(&self) -> bool {
        self.status == IntegrationStatus::Success
    }

    pub fn failed(&self) -> bool {
        self.status == IntegrationStatus::Failure
    }

    /// This cycle succeeded and the previous one failed.
    pub fn fixed(&self) -> bool {
        self.succeeded() && self.last_integration.status == IntegrationStatus::Failure
    }

    pub fn exception_result(&self) -> Option<&BuildFailure> {
        self.exception.as_ref()
    }

    /// Attach the top-level exception. A non-empty value forces `Exception`.
    pub fn set_exception_result(&mut self, failure: Option<BuildFailure>) {
        if failure.is_some() {
            self.status = IntegrationStatus::Exception;
        }
        self.exception = failure;
    }

    pub fn source_control_error(&self) -> Option<&BuildFailure> {
        self.source_control_error.as_ref()
    }

    /// Record a modification-detection failure. Does not change the status.
    pub fn set_source_control_error(&mut self, failure: Option<BuildFailure>) {
        self.has_source_control_error = failure.is_some();
        self.source_control_error = failure;
    }

    pub fn has_source_control_error(&self) -> bool {
        self.has_source_control_error
    }

    /// Status of the last build that got past source control.
    pub fn last_build_status(&self) -> IntegrationStatus {
        self.last_build_status
    }

    pub fn set_last_build_status(&mut self, status: IntegrationStatus) {
        self.last_build_status = status;
    }

    // -- task results -----------------------------------------------------

    pub fn task_results(&self) -> &[TaskResult] {
        &self.task_results
    }

    /// Record a task result.
    ///
    /// Once the status is `Failure` or `Exception` later results are still
    /// recorded but no longer change the status.
    pub fn add_task_result(&mut self, result: TaskResult) {
        let succeeded = result.check_if_success();
        self.task_results.push(result);
        if self.status.is_broken() {
            return;
        }
        self.status = if succeeded {
            IntegrationStatus::Success
        } else {
            IntegrationStatus::Failure
        };
    }

    /// Concatenated output of every recorded task.
    pub fn task_output(&self) -> String {
        self.task_results.iter().map(|r| r.data.as_str()).collect()
    }

    /// Fold a nested result into this one.
    pub fn merge(&mut self, other: &IntegrationResult) {
        if other.status == IntegrationStatus::Exception || self.status == IntegrationStatus::Unknown
        {
            self.status = other.status;
        } else if matches!(
            other.status,
            IntegrationStatus::Failure | IntegrationStatus::Cancelled
        ) && self.status != IntegrationStatus::Exception
        {
            self.status = other.status;
        }

        if let Some(incoming) = &other.exception {
            self.exception = Some(match self.exception.take() {
                Some(existing) => existing.combine(incoming.clone()),
                None => incoming.clone(),
            });
        }

        for result in &other.task_results {
            self.add_task_result(result.clone());
        }
    }

    // -- label ------------------------------------------------------------

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Assign the label. An empty label falls back to the initial sentinel.
    pub fn set_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.label = if label.is_empty() {
            INITIAL_LABEL.to_string()
        } else {
            label
        };
    }

    pub fn is_initial(&self) -> bool {
        self.label == INITIAL_LABEL
    }

    /// Trailing digits of the label as a number, or 0 when there are none.
    pub fn numeric_label(&self) -> u32 {
        numeric_suffix(&self.label)
    }

    pub fn last_successful_integration_label(&self) -> String {
        match (&self.last_integration.last_successful_label, self.succeeded()) {
            (Some(previous), false) => previous.clone(),
            _ => self.label.clone(),
        }
    }

    // -- timing -----------------------------------------------------------

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn mark_start_time(&mut self) {
        self.start_time = Utc::now();
    }

    pub fn mark_end_time(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// `end - start`, once the end time has been marked.
    pub fn total_integration_time(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    // -- modifications ----------------------------------------------------

    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    pub fn set_modifications(&mut self, modifications: Vec<Modification>) {
        self.modifications = modifications;
    }

    pub fn has_modifications(&self) -> bool {
        !self.modifications.is_empty()
    }

    pub fn should_run_build(&self) -> bool {
        self.build_condition() == BuildCondition::ForceBuild || self.has_modifications()
    }

    pub fn last_change_number(&self) -> Option<String> {
        last_change_number(&self.modifications)
    }

    /// Latest modification time, or one day ago when nothing changed.
    pub fn last_modification_date(&self) -> DateTime<Utc> {
        self.modifications
            .iter()
            .map(|m| m.modified_time)
            .max()
            .unwrap_or_else(|| Utc::now() - Duration::days(1))
    }

    /// Distinct authors of this cycle's modifications, in first-seen order.
    pub fn modifying_users(&self) -> Vec<String> {
        let mut users: Vec<String> = Vec::new();
        for modification in &self.modifications {
            if !users.contains(&modification.user_name) {
                users.push(modification.user_name.clone());
            }
        }
        users
    }

    // -- failure attribution ----------------------------------------------

    pub fn failure_users(&self) -> &[String] {
        &self.failure_users
    }

    pub fn failure_tasks(&self) -> &[String] {
        &self.failure_tasks
    }

    pub fn add_failure_task(&mut self, task: impl Into<String>) {
        let task = task.into();
        if !self.failure_tasks.contains(&task) {
            self.failure_tasks.push(task);
        }
    }

    /// Extend the failure streak with this cycle's authors, or clear it.
    pub fn update_failure_attribution(&mut self) {
        if self.status.is_broken() {
            for user in self.modifying_users() {
                if !self.failure_users.contains(&user) {
                    self.failure_users.push(user);
                }
            }
        } else {
            self.failure_users.clear();
            self.failure_tasks.clear();
        }
    }

    // -- paths ------------------------------------------------------------

    /// `<artifact dir>/<label>`
    pub fn integration_artifact_directory(&self) -> PathBuf {
        self.artifact_directory.join(&self.label)
    }

    pub fn listener_file(&self) -> PathBuf {
        self.artifact_directory.join(format!(
            "{}_ListenFile.xml",
            sanitize_file_name(&self.project_name)
        ))
    }

    pub fn base_from_artifacts_directory(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.artifact_directory.clone()
        } else {
            self.artifact_directory.join(path)
        }
    }

    pub fn base_from_working_directory(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.working_directory.clone()
        } else {
            self.working_directory.join(path)
        }
    }

    // -- properties & parameters ------------------------------------------

    /// Every externally visible attribute, keyed by contract name.
    ///
    /// Regenerated on each call.
    pub fn integration_properties(&self) -> IntegrationProperties {
        let mut props = IntegrationProperties::new();
        let mut put = |key: &str, value: PropertyValue| {
            props.insert(key.to_string(), value);
        };

        put(properties::PROJECT, self.project_name.as_str().into());
        if let Some(url) = &self.project_url {
            put(properties::PROJECT_URL, url.as_str().into());
        }
        put(
            properties::WORKING_DIRECTORY,
            self.working_directory.display().to_string().into(),
        );
        put(
            properties::ARTIFACT_DIRECTORY,
            self.artifact_directory.display().to_string().into(),
        );
        put(
            properties::INTEGRATION_STATUS,
            PropertyValue::Status(self.status),
        );
        put(properties::LABEL, self.label.as_str().into());
        put(
            properties::BUILD_CONDITION,
            PropertyValue::Condition(self.build_condition()),
        );
        put(
            properties::NUMERIC_LABEL,
            PropertyValue::Number(i64::from(self.numeric_label())),
        );

        let local_start = self.start_time.with_timezone(&Local);
        put(
            properties::BUILD_DATE,
            local_start.format("%Y-%m-%d").to_string().into(),
        );
        put(
            properties::BUILD_TIME,
            local_start.format("%H:%M:%S").to_string().into(),
        );
        put(
            properties::LAST_INTEGRATION_STATUS,
            PropertyValue::Status(self.last_integration.status),
        );
        put(
            properties::LISTENER_FILE,
            self.listener_file().display().to_string().into(),
        );
        put(
            properties::FAILURE_USERS,
            PropertyValue::List(self.failure_users.clone()),
        );
        put(
            properties::FAILURE_TASKS,
            PropertyValue::List(self.failure_tasks.clone()),
        );
        put(
            properties::MODIFYING_USERS,
            PropertyValue::List(self.modifying_users()),
        );
        put(
            properties::USER,
            self.request.user_name().unwrap_or_default().into(),
        );
        put(
            properties::BUILD_ID,
            self.build_id.simple().to_string().into(),
        );
        if let Some(change) = self.last_change_number() {
            put(properties::LAST_CHANGE_NUMBER, change.into());
        }
        put(properties::REQUEST_SOURCE, self.request.source().into());

        props
    }

    /// Expose every integration property as a `$`-prefixed build parameter.
    ///
    /// Values are written to both the request's build values and the
    /// parameter list; existing parameters are replaced in place.
    pub fn generate_system_parameter_values(&mut self) {
        for (key, value) in self.integration_properties() {
            let name = properties::parameter_name(&key);
            let value = value.to_string();
            self.request.set_build_value(name.clone(), value.clone());
            self.parameters.upsert(name, value);
        }
    }

    /// Keep the previous cycle's start time as the point the next cycle
    /// looks for changes from. For cycles that are recorded without building.
    pub fn keep_modification_boundary(&mut self) {
        self.modification_boundary = Some(self.last_integration.start_time);
    }

    /// The "changes since" time the next cycle starts from.
    pub fn modification_boundary(&self) -> DateTime<Utc> {
        self.modification_boundary.unwrap_or(self.start_time)
    }

    /// Distill into the summary that seeds the next cycle.
    pub fn to_summary(&self) -> IntegrationSummary {
        IntegrationSummary {
            status: self.status,
            label: self.label.clone(),
            last_successful_label: Some(self.last_successful_integration_label()),
            start_time: self.modification_boundary(),
            failure_users: self.failure_users.clone(),
            failure_tasks: self.failure_tasks.clone(),
            has_source_control_error: self.has_source_control_error,
            last_build_status: self.last_build_status,
        }
    }
}

impl PartialEq for IntegrationResult {
    fn eq(&self, other: &Self) -> bool {
        self.project_name == other.project_name
            && self.status == other.status
            && self.label == other.label
            && self.start_time == other.start_time
    }
}

impl std::fmt::Display for IntegrationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Project: {}, Status: {}, Label: {}, StartTime: {}",
            self.project_name, self.status, self.label, self.start_time
        )
    }
}

/// Maximal trailing run of decimal digits in `label`, or 0.
///
/// Never negative: labels are often joined with `-`, so a sign would be
/// ambiguous.
pub fn numeric_suffix(label: &str) -> u32 {
    let prefix_len = label.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    label[prefix_len..].parse().unwrap_or(0)
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(status: IntegrationStatus, label: &str) -> IntegrationSummary {
        IntegrationSummary::new(status, label, None, Utc::now())
    }

    fn result_after(last: IntegrationSummary) -> IntegrationResult {
        IntegrationResult::new(
            "project",
            "/work",
            "/artifacts",
            IntegrationRequest::new(BuildCondition::IfModificationExists, "test", None),
            last,
        )
    }

    fn modification(user: &str, change: &str) -> Modification {
        Modification::new(user, change, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_new_result_defaults() {
        let result = result_after(summary(IntegrationStatus::Success, "5"));
        assert_eq!(result.status(), IntegrationStatus::Unknown);
        assert_eq!(result.label(), "5");
        assert!(result.modifications().is_empty());
        assert!(result.exception_result().is_none());
        assert!(result.end_time().is_none());
    }

    #[test]
    fn test_initial_last_integration_forces_build() {
        let result = result_after(IntegrationSummary::initial());
        assert_eq!(result.label(), INITIAL_LABEL);
        assert!(result.is_initial());
        assert_eq!(result.build_condition(), BuildCondition::ForceBuild);
        assert!(result.should_run_build());
    }

    #[test]
    fn test_build_ids_are_unique() {
        let a = result_after(IntegrationSummary::initial());
        let b = result_after(IntegrationSummary::initial());
        assert_ne!(a.build_id(), b.build_id());
    }

    #[test]
    fn test_task_results_first_failure_wins() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.add_task_result(TaskResult::success("a", ""));
        assert_eq!(result.status(), IntegrationStatus::Success);

        result.add_task_result(TaskResult::failure("b", ""));
        assert_eq!(result.status(), IntegrationStatus::Failure);

        result.add_task_result(TaskResult::success("c", ""));
        assert_eq!(result.status(), IntegrationStatus::Failure);
        assert_eq!(result.task_results().len(), 3);
    }

    #[test]
    fn test_task_results_never_downgrade_exception() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.set_exception_result(Some(BuildFailure::prebuild("boom")));
        result.add_task_result(TaskResult::success("a", ""));
        result.add_task_result(TaskResult::failure("b", ""));
        assert_eq!(result.status(), IntegrationStatus::Exception);
    }

    #[test]
    fn test_exception_setter_forces_status() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.set_status(IntegrationStatus::Success);
        result.set_exception_result(Some(BuildFailure::labelling("no label")));
        assert_eq!(result.status(), IntegrationStatus::Exception);
    }

    #[test]
    fn test_source_control_error_does_not_change_status() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.set_source_control_error(Some(BuildFailure::source_control("offline")));
        assert!(result.has_source_control_error());
        assert_eq!(result.status(), IntegrationStatus::Unknown);

        result.set_source_control_error(None);
        assert!(!result.has_source_control_error());
    }

    #[test]
    fn test_merge_exceptions_accumulate_in_order() {
        let e1 = BuildFailure::task("one", "1");
        let e2 = BuildFailure::task("two", "2");
        let e3 = BuildFailure::task("three", "3");

        let mut parent = result_after(summary(IntegrationStatus::Success, "1"));
        parent.set_exception_result(Some(e1.clone()));

        let mut child = result_after(summary(IntegrationStatus::Success, "1"));
        child.set_exception_result(Some(e2.clone()));
        parent.merge(&child);
        assert_eq!(
            parent.exception_result().map(|e| e.failures()),
            Some(vec![&e1, &e2])
        );

        let mut child = result_after(summary(IntegrationStatus::Success, "1"));
        child.set_exception_result(Some(e3.clone()));
        parent.merge(&child);
        assert_eq!(
            parent.exception_result().map(|e| e.failures()),
            Some(vec![&e1, &e2, &e3])
        );
    }

    #[test]
    fn test_merge_single_exception_is_not_wrapped() {
        let e1 = BuildFailure::task("one", "1");
        let mut parent = result_after(summary(IntegrationStatus::Success, "1"));
        let mut child = result_after(summary(IntegrationStatus::Success, "1"));
        child.set_exception_result(Some(e1.clone()));

        parent.merge(&child);
        assert_eq!(parent.exception_result(), Some(&e1));
        assert_eq!(parent.status(), IntegrationStatus::Exception);
    }

    #[test]
    fn test_merge_status_precedence() {
        let with_status = |status| {
            let mut r = result_after(summary(IntegrationStatus::Success, "1"));
            r.set_status(status);
            r
        };

        let mut parent = with_status(IntegrationStatus::Unknown);
        parent.merge(&with_status(IntegrationStatus::Success));
        assert_eq!(parent.status(), IntegrationStatus::Success);

        parent.merge(&with_status(IntegrationStatus::Cancelled));
        assert_eq!(parent.status(), IntegrationStatus::Cancelled);

        parent.merge(&with_status(IntegrationStatus::Success));
        assert_eq!(parent.status(), IntegrationStatus::Cancelled);

        parent.merge(&with_status(IntegrationStatus::Exception));
        assert_eq!(parent.status(), IntegrationStatus::Exception);

        parent.merge(&with_status(IntegrationStatus::Failure));
        assert_eq!(parent.status(), IntegrationStatus::Exception);
    }

    #[test]
    fn test_merge_reapplies_task_results() {
        let mut parent = result_after(summary(IntegrationStatus::Success, "1"));
        parent.add_task_result(TaskResult::success("a", ""));

        let mut child = result_after(summary(IntegrationStatus::Success, "1"));
        child.add_task_result(TaskResult::failure("b", ""));
        child.add_task_result(TaskResult::success("c", ""));

        parent.merge(&child);
        assert_eq!(parent.task_results().len(), 3);
        assert_eq!(parent.status(), IntegrationStatus::Failure);
    }

    #[test]
    fn test_numeric_label() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        let cases = [
            ("build-42", 42),
            ("release", 0),
            ("v1.2.3", 3),
            ("17", 17),
            ("1.0-rc", 0),
            ("build-99999999999999999999", 0),
        ];
        for (label, expected) in cases {
            result.set_label(label);
            assert_eq!(result.numeric_label(), expected, "label {label}");
        }
    }

    #[test]
    fn test_empty_label_falls_back_to_sentinel() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.set_label("");
        assert_eq!(result.label(), INITIAL_LABEL);
    }

    #[test]
    fn test_failure_users_inherited_from_failed_cycle() {
        let mut last = summary(IntegrationStatus::Failure, "3");
        last.failure_users = vec!["alice".to_string(), "bob".to_string()];
        last.failure_tasks = vec!["compile".to_string()];

        let result = result_after(last.clone());
        assert_eq!(result.failure_users(), last.failure_users.as_slice());
        assert_eq!(result.failure_tasks(), last.failure_tasks.as_slice());
    }

    #[test]
    fn test_failure_users_not_inherited_after_success() {
        let mut last = summary(IntegrationStatus::Success, "3");
        last.failure_users = vec!["alice".to_string()];
        let result = result_after(last);
        assert!(result.failure_users().is_empty());
    }

    #[test]
    fn test_failure_attribution_extends_and_clears() {
        let mut last = summary(IntegrationStatus::Failure, "3");
        last.failure_users = vec!["alice".to_string()];
        let mut result = result_after(last);
        result.set_modifications(vec![modification("bob", "2"), modification("alice", "3")]);
        result.set_status(IntegrationStatus::Failure);
        result.update_failure_attribution();
        assert_eq!(result.failure_users(), ["alice", "bob"]);

        result.set_status(IntegrationStatus::Success);
        result.update_failure_attribution();
        assert!(result.failure_users().is_empty());
        assert!(result.failure_tasks().is_empty());
    }

    #[test]
    fn test_fixed_truth_table() {
        let check = |last, current, expected| {
            let mut result = result_after(summary(last, "1"));
            result.set_status(current);
            assert_eq!(result.fixed(), expected, "{last:?} -> {current:?}");
        };
        check(IntegrationStatus::Failure, IntegrationStatus::Success, true);
        check(IntegrationStatus::Exception, IntegrationStatus::Success, false);
        check(IntegrationStatus::Success, IntegrationStatus::Success, false);
        check(IntegrationStatus::Failure, IntegrationStatus::Failure, false);
        check(IntegrationStatus::Unknown, IntegrationStatus::Success, false);
    }

    #[test]
    fn test_last_modification_date_without_modifications() {
        let result = result_after(summary(IntegrationStatus::Success, "1"));
        let expected = Utc::now() - Duration::days(1);
        let delta = (result.last_modification_date() - expected).num_seconds().abs();
        assert!(delta < 5);
    }

    #[test]
    fn test_last_modification_date_uses_latest() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        result.set_modifications(vec![
            Modification::new("a", "1", late),
            Modification::new("b", "2", early),
        ]);
        assert_eq!(result.last_modification_date(), late);
    }

    #[test]
    fn test_properties_omit_missing_project_url() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        assert!(!result
            .integration_properties()
            .contains_key(properties::PROJECT_URL));

        result.set_project_url(Some("http://ci/project".to_string()));
        assert_eq!(
            result.integration_properties().get(properties::PROJECT_URL),
            Some(&PropertyValue::Text("http://ci/project".to_string()))
        );
    }

    #[test]
    fn test_properties_contents() {
        let mut result = result_after(summary(IntegrationStatus::Failure, "build-9"));
        result.set_modifications(vec![
            modification("alice", "10"),
            modification("bob", "12"),
            modification("alice", "11"),
        ]);
        let props = result.integration_properties();

        assert_eq!(props[properties::LABEL].to_string(), "build-9");
        assert_eq!(props[properties::NUMERIC_LABEL].to_string(), "9");
        assert_eq!(props[properties::LAST_INTEGRATION_STATUS].to_string(), "Failure");
        assert_eq!(props[properties::MODIFYING_USERS].to_string(), "alice,bob");
        assert_eq!(props[properties::LAST_CHANGE_NUMBER].to_string(), "12");
        assert_eq!(props[properties::REQUEST_SOURCE].to_string(), "test");
        assert_eq!(props[properties::USER].to_string(), "");

        let build_id = props[properties::BUILD_ID].to_string();
        assert_eq!(build_id.len(), 32);
        assert!(build_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_properties_omit_change_number_without_modifications() {
        let result = result_after(summary(IntegrationStatus::Success, "1"));
        assert!(!result
            .integration_properties()
            .contains_key(properties::LAST_CHANGE_NUMBER));
    }

    #[test]
    fn test_generate_system_parameter_values() {
        let mut result = result_after(summary(IntegrationStatus::Success, "4"));
        result.parameters_mut().upsert("user-param", "x");
        result.generate_system_parameter_values();

        assert_eq!(result.parameters().get("$CCNetLabel"), Some("4"));
        assert_eq!(
            result.integration_request().build_values().get("$CCNetLabel"),
            Some(&"4".to_string())
        );
        assert_eq!(result.parameters().position("user-param"), Some(0));

        let position = result.parameters().position("$CCNetLabel");
        let count = result.parameters().len();
        result.set_label("5");
        result.generate_system_parameter_values();
        assert_eq!(result.parameters().get("$CCNetLabel"), Some("5"));
        assert_eq!(result.parameters().position("$CCNetLabel"), position);
        assert_eq!(result.parameters().len(), count);
    }

    #[test]
    fn test_last_successful_label() {
        let last = IntegrationSummary::new(
            IntegrationStatus::Success,
            "7",
            Some("7".to_string()),
            Utc::now(),
        );
        let mut result = result_after(last);
        result.set_label("8");
        result.set_status(IntegrationStatus::Failure);
        assert_eq!(result.last_successful_integration_label(), "7");

        result.set_status(IntegrationStatus::Success);
        assert_eq!(result.last_successful_integration_label(), "8");
    }

    #[test]
    fn test_to_summary() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.set_label("2");
        result.set_status(IntegrationStatus::Success);
        let next = result.to_summary();
        assert_eq!(next.status, IntegrationStatus::Success);
        assert_eq!(next.label, "2");
        assert_eq!(next.last_successful_label.as_deref(), Some("2"));
        assert_eq!(next.start_time, result.start_time());
    }

    #[test]
    fn test_to_summary_keeps_boundary_of_unbuilt_cycle() {
        let last = IntegrationSummary::new(
            IntegrationStatus::Success,
            "4",
            Some("4".into()),
            Utc::now() - Duration::hours(2),
        );
        let mut result = result_after(last.clone());
        result.set_source_control_error(Some(BuildFailure::source_control("down")));
        result.set_status(IntegrationStatus::Success);
        result.keep_modification_boundary();

        let next = result.to_summary();
        assert_eq!(next.start_time, last.start_time);
        assert!(next.has_source_control_error);
        assert!(result.start_time() > last.start_time);
    }

    #[test]
    fn test_paths() {
        let mut result = IntegrationResult::new(
            "my:project",
            "/work",
            "/artifacts",
            IntegrationRequest::null_request(),
            summary(IntegrationStatus::Success, "3"),
        );
        result.set_label("3");
        assert_eq!(
            result.integration_artifact_directory(),
            PathBuf::from("/artifacts/3")
        );
        assert_eq!(
            result.listener_file(),
            PathBuf::from("/artifacts/myproject_ListenFile.xml")
        );
        assert_eq!(result.base_from_working_directory(""), PathBuf::from("/work"));
        assert_eq!(
            result.base_from_working_directory("src"),
            PathBuf::from("/work/src")
        );
    }

    #[test]
    fn test_create_initial() {
        let result = IntegrationResult::create_initial("project", "/work", "/artifacts");
        assert_eq!(result.integration_request().source(), "Initial Build");
        assert_eq!(
            result.total_integration_time().map(|d| d.num_hours()),
            Some(24)
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        let snapshot = result.clone();
        result.add_task_result(TaskResult::failure("a", ""));
        assert!(snapshot.task_results().is_empty());
        assert_eq!(snapshot.status(), IntegrationStatus::Unknown);
    }

    #[test]
    fn test_task_output_concatenates() {
        let mut result = result_after(summary(IntegrationStatus::Success, "1"));
        result.add_task_result(TaskResult::data("one;"));
        result.add_task_result(TaskResult::data("two"));
        assert_eq!(result.task_output(), "one;two");
    }
}
