//! Git-backed source control, driven through the `git` CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::{BuildFailure, BuildResult, IntegrationResult, IntegrationSummary, Modification};
use crate::source_control::SourceControl;

const FIELD_SEP: char = '\u{1f}';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%aI%x1f%s";

/// Source-control data key holding the commit the cycle built.
pub const HEAD_COMMIT_KEY: &str = "commit";

async fn run_git(repo_dir: &Path, args: &[&str]) -> BuildResult<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .await
        .map_err(|e| BuildFailure::source_control(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildFailure::source_control(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Capture the HEAD commit SHA from a git repository.
pub async fn capture_head_sha(repo_dir: &Path) -> BuildResult<String> {
    let sha = run_git(repo_dir, &["rev-parse", "HEAD"]).await?;
    let sha = sha.trim().to_string();
    if sha.is_empty() {
        return Err(BuildFailure::source_control(
            "git rev-parse HEAD returned empty output",
        ));
    }
    Ok(sha)
}

/// Check whether a directory is inside a git work tree.
pub async fn is_git_repo(dir: &Path) -> bool {
    run_git(dir, &["rev-parse", "--is-inside-work-tree"])
        .await
        .is_ok()
}

fn parse_log_line(line: &str) -> Option<Modification> {
    let mut fields = line.splitn(5, FIELD_SEP);
    let sha = fields.next()?;
    let author = fields.next()?;
    let email = fields.next()?;
    let date = fields.next()?;
    let subject = fields.next().unwrap_or_default();

    let modified_time = DateTime::parse_from_rfc3339(date)
        .ok()?
        .with_timezone(&Utc);
    let mut modification = Modification::new(author, sha, modified_time).with_comment(subject);
    if !email.is_empty() {
        modification.email_address = Some(email.to_string());
    }
    Some(modification)
}

/// Git repository settings for a project.
///
/// When the checkout has the configured remote, each check fetches it and
/// reports the upstream commits the checkout does not have yet. Without the
/// remote, commits in the checkout since the last cycle are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSourceControl {
    /// Repository checkout; the cycle's working directory when unset.
    pub repository: Option<PathBuf>,
    pub remote: String,
    /// Remote branch to follow; the checkout's upstream when unset.
    /// `origin/main` and `main` name the same branch.
    pub branch: Option<String>,
    /// Pull before building.
    pub auto_get_source: bool,
    /// Tag successful builds with `<tag_prefix><label>`.
    pub tag_on_success: bool,
    pub tag_prefix: String,
}

impl Default for GitSourceControl {
    fn default() -> Self {
        Self {
            repository: None,
            remote: "origin".to_string(),
            branch: None,
            auto_get_source: true,
            tag_on_success: false,
            tag_prefix: String::new(),
        }
    }
}

impl GitSourceControl {
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: Some(repository.into()),
            ..Self::default()
        }
    }

    fn repo_dir<'a>(&'a self, result: &'a IntegrationResult) -> &'a Path {
        self.repository
            .as_deref()
            .unwrap_or_else(|| result.working_directory())
    }

    /// Branch name without a leading `<remote>/`.
    fn branch_name(&self) -> Option<&str> {
        self.branch.as_deref().map(|branch| {
            branch
                .strip_prefix(self.remote.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(branch)
        })
    }

    fn upstream_ref(&self) -> String {
        match self.branch_name() {
            Some(branch) => format!("{}/{}", self.remote, branch),
            None => "@{upstream}".to_string(),
        }
    }

    async fn has_remote(&self, repo_dir: &Path) -> BuildResult<bool> {
        let remotes = run_git(repo_dir, &["remote"]).await?;
        Ok(remotes.lines().any(|line| line.trim() == self.remote))
    }

    fn log_args(&self, from: &IntegrationSummary, tracking_remote: bool) -> Vec<String> {
        let mut args = vec!["log".to_string(), LOG_FORMAT.to_string()];
        let pending_only = tracking_remote && self.auto_get_source;
        if from.is_initial() {
            args.push("-n1".to_string());
        } else if !pending_only {
            args.push(format!("--since={}", from.start_time.to_rfc3339()));
        }

        if tracking_remote {
            let upstream = self.upstream_ref();
            if pending_only && !from.is_initial() {
                args.push(format!("HEAD..{upstream}"));
            } else {
                args.push(upstream);
            }
        } else if let Some(branch) = self.branch_name() {
            args.push(branch.to_string());
        }
        args
    }
}

#[async_trait]
impl SourceControl for GitSourceControl {
    async fn get_modifications(
        &self,
        from: &IntegrationSummary,
        to: &IntegrationResult,
    ) -> BuildResult<Vec<Modification>> {
        let repo = self.repo_dir(to);
        let tracking_remote = self.has_remote(repo).await?;
        if tracking_remote {
            run_git(repo, &["fetch", "--quiet", self.remote.as_str()]).await?;
        }

        let args = self.log_args(from, tracking_remote);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = run_git(repo, &args).await?;

        let modifications: Vec<Modification> = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_log_line)
            .collect();
        debug!(
            project = %to.project_name(),
            count = modifications.len(),
            tracking_remote,
            "git log scanned"
        );
        Ok(modifications)
    }

    async fn get_source(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        let repo = self.repo_dir(result).to_path_buf();
        if self.auto_get_source && self.has_remote(&repo).await? {
            let mut args = vec!["pull", "--ff-only", self.remote.as_str()];
            if let Some(branch) = self.branch_name() {
                args.push(branch);
            }
            run_git(&repo, &args).await?;
        }

        let sha = capture_head_sha(&repo).await?;
        result.source_control_data_mut().upsert(HEAD_COMMIT_KEY, sha);
        Ok(())
    }

    async fn label_source_control(&self, result: &mut IntegrationResult) -> BuildResult<()> {
        if !self.tag_on_success || !result.succeeded() {
            return Ok(());
        }
        let tag = format!("{}{}", self.tag_prefix, result.label());
        run_git(self.repo_dir(result), &["tag", &tag]).await?;
        info!(project = %result.project_name(), tag = %tag, "Tagged repository");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntegrationRequest, IntegrationStatus};
    use std::process::Command as StdCommand;

    fn git(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.name", "test-user"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    fn commit(repo_dir: &Path, message: &str) {
        git(repo_dir, &["commit", "--allow-empty", "-m", message]);
    }

    /// A bare remote on `main` plus a clone of it used as the build checkout.
    /// Returns (remote, checkout, pusher) where `pusher` is a second clone
    /// for publishing new commits.
    fn make_remote_setup() -> (tempfile::TempDir, tempfile::TempDir, tempfile::TempDir) {
        let remote = tempfile::tempdir().unwrap();
        git(remote.path(), &["init", "--bare"]);
        git(remote.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let pusher = tempfile::tempdir().unwrap();
        git(pusher.path(), &["init"]);
        git(pusher.path(), &["checkout", "-b", "main"]);
        git(pusher.path(), &["config", "user.name", "pusher"]);
        git(pusher.path(), &["config", "user.email", "pusher@example.com"]);
        git(
            pusher.path(),
            &["remote", "add", "origin", remote.path().to_str().unwrap()],
        );
        commit(pusher.path(), "initial");
        git(pusher.path(), &["push", "origin", "HEAD:main"]);

        let checkout = tempfile::tempdir().unwrap();
        git(
            checkout.path(),
            &["clone", remote.path().to_str().unwrap(), "."],
        );
        (remote, checkout, pusher)
    }

    fn summary_after_first_build() -> IntegrationSummary {
        IntegrationSummary::new(IntegrationStatus::Success, "1", Some("1".into()), Utc::now())
    }

    fn result_for(repo: &Path) -> IntegrationResult {
        IntegrationResult::new(
            "demo",
            repo,
            repo.join("artifacts"),
            IntegrationRequest::null_request(),
            IntegrationSummary::initial(),
        )
    }

    fn local_only(repo: &Path) -> GitSourceControl {
        GitSourceControl {
            auto_get_source: false,
            ..GitSourceControl::new(repo)
        }
    }

    #[test]
    fn remote_prefix_is_stripped_from_branch() {
        let sc = GitSourceControl {
            branch: Some("origin/main".into()),
            ..GitSourceControl::default()
        };
        assert_eq!(sc.branch_name(), Some("main"));
        assert_eq!(sc.upstream_ref(), "origin/main");

        let plain = GitSourceControl {
            branch: Some("release/1.x".into()),
            ..GitSourceControl::default()
        };
        assert_eq!(plain.branch_name(), Some("release/1.x"));
        assert_eq!(plain.upstream_ref(), "origin/release/1.x");
        assert_eq!(GitSourceControl::default().upstream_ref(), "@{upstream}");
    }

    #[test]
    fn parse_log_line_reads_all_fields() {
        let line = "abc123\u{1f}alice\u{1f}alice@example.com\u{1f}2024-03-01T10:00:00+00:00\u{1f}fix: a | b";
        let m = parse_log_line(line).unwrap();
        assert_eq!(m.change_number, "abc123");
        assert_eq!(m.user_name, "alice");
        assert_eq!(m.email_address.as_deref(), Some("alice@example.com"));
        assert_eq!(m.comment.as_deref(), Some("fix: a | b"));
    }

    #[test]
    fn parse_log_line_rejects_garbage() {
        assert!(parse_log_line("not a log line").is_none());
    }

    #[tokio::test]
    async fn capture_head_sha_returns_40_hex_chars() {
        let repo = make_git_repo();
        let sha = capture_head_sha(repo.path()).await.unwrap();
        assert_eq!(sha.len(), 40, "SHA should be 40 hex chars, got: {sha}");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn is_git_repo_false_for_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()).await);
    }

    #[tokio::test]
    async fn first_cycle_sees_head_commit() {
        let repo = make_git_repo();
        let sc = local_only(repo.path());
        let to = result_for(repo.path());

        let mods = sc
            .get_modifications(&IntegrationSummary::initial(), &to)
            .await
            .unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].user_name, "test-user");
        assert_eq!(mods[0].comment.as_deref(), Some("initial"));
    }

    #[tokio::test]
    async fn no_changes_since_a_future_cycle() {
        let repo = make_git_repo();
        let sc = local_only(repo.path());
        let to = result_for(repo.path());
        let from = IntegrationSummary::new(
            IntegrationStatus::Success,
            "1",
            Some("1".into()),
            Utc::now() + chrono::Duration::hours(1),
        );

        let mods = sc.get_modifications(&from, &to).await.unwrap();
        assert!(mods.is_empty());
    }

    #[tokio::test]
    async fn get_source_records_head_commit() {
        let repo = make_git_repo();
        let sc = local_only(repo.path());
        let mut result = result_for(repo.path());

        sc.get_source(&mut result).await.unwrap();
        let expected = capture_head_sha(repo.path()).await.unwrap();
        assert_eq!(
            result.source_control_data().get(HEAD_COMMIT_KEY),
            Some(expected.as_str())
        );
    }

    #[tokio::test]
    async fn successful_build_is_tagged() {
        let repo = make_git_repo();
        let sc = GitSourceControl {
            tag_on_success: true,
            tag_prefix: "ci-".into(),
            ..local_only(repo.path())
        };
        let mut result = result_for(repo.path());
        result.set_label("7");
        result.set_status(IntegrationStatus::Success);

        sc.label_source_control(&mut result).await.unwrap();
        assert_eq!(git(repo.path(), &["tag", "--list"]).trim(), "ci-7");
    }

    #[tokio::test]
    async fn failed_build_is_not_tagged() {
        let repo = make_git_repo();
        let sc = GitSourceControl {
            tag_on_success: true,
            ..local_only(repo.path())
        };
        let mut result = result_for(repo.path());
        result.set_status(IntegrationStatus::Failure);

        sc.label_source_control(&mut result).await.unwrap();
        assert!(git(repo.path(), &["tag", "--list"]).trim().is_empty());
    }

    #[tokio::test]
    async fn pushed_commits_are_detected_and_pulled() {
        let (_remote, checkout, pusher) = make_remote_setup();
        let sc = GitSourceControl::new(checkout.path());
        let mut to = result_for(checkout.path());
        let from = summary_after_first_build();

        assert!(sc.get_modifications(&from, &to).await.unwrap().is_empty());

        commit(pusher.path(), "pushed change");
        git(pusher.path(), &["push", "origin", "HEAD:main"]);

        let mods = sc.get_modifications(&from, &to).await.unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].comment.as_deref(), Some("pushed change"));
        assert_eq!(mods[0].user_name, "pusher");

        sc.get_source(&mut to).await.unwrap();
        let pushed = capture_head_sha(pusher.path()).await.unwrap();
        assert_eq!(
            to.source_control_data().get(HEAD_COMMIT_KEY),
            Some(pushed.as_str())
        );
        assert!(sc.get_modifications(&from, &to).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_qualified_branch_is_followed() {
        let (_remote, checkout, pusher) = make_remote_setup();
        let sc = GitSourceControl {
            branch: Some("origin/main".into()),
            ..GitSourceControl::new(checkout.path())
        };
        let mut to = result_for(checkout.path());

        commit(pusher.path(), "on main");
        git(pusher.path(), &["push", "origin", "HEAD:main"]);

        let mods = sc
            .get_modifications(&summary_after_first_build(), &to)
            .await
            .unwrap();
        assert_eq!(mods.len(), 1);
        sc.get_source(&mut to).await.unwrap();
        assert_eq!(
            capture_head_sha(checkout.path()).await.unwrap(),
            capture_head_sha(pusher.path()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn outside_a_repository_is_a_source_control_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sc = local_only(dir.path());
        let to = result_for(dir.path());
        let err = sc
            .get_modifications(&IntegrationSummary::initial(), &to)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildFailure::SourceControl { .. }));
    }
}
