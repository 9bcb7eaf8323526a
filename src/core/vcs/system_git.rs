//! System git backend
//!
//! Every repository read and write goes through the `git` binary. Commands run
//! with an isolated environment so user-level `GIT_*` variables cannot redirect
//! them, while keeping what pushes and signing need (SSH agent, GPG home) and
//! the identity a CI job may set only through the environment.

use crate::core::error::{GitError, ResultExt, ShipError, ShipResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Environment variables passed through to git
const PASSTHROUGH_ENV: [&str; 11] = [
  "PATH",
  "HOME",
  "XDG_CONFIG_HOME",
  "SSH_AUTH_SOCK",
  "GIT_SSH_COMMAND",
  "GNUPGHOME",
  "GPG_TTY",
  "GIT_AUTHOR_NAME",
  "GIT_AUTHOR_EMAIL",
  "GIT_COMMITTER_NAME",
  "GIT_COMMITTER_EMAIL",
];

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Working tree root
  pub(crate) work_tree: PathBuf,
  /// Passthrough variables captured when the repository was opened
  pub(crate) env: Vec<(&'static str, String)>,
}

/// Values of the passthrough variables that `lookup` knows about
pub(crate) fn passthrough_env(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
  PASSTHROUGH_ENV
    .iter()
    .filter_map(|&key| lookup(key).map(|value| (key, value)))
    .collect()
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to find the working tree root.
  pub fn open(path: &Path) -> ShipResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ShipError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ShipError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = PathBuf::from(stdout.trim());
    debug!(work_tree = %work_tree.display(), "opened repository");

    Ok(Self {
      work_tree,
      env: passthrough_env(|key| std::env::var(key).ok()),
    })
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ShipResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Get abbreviated HEAD commit SHA
  pub fn short_head(&self) -> ShipResult<String> {
    let output = self.run(&["rev-parse", "--short", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Get current branch name, `None` on a detached HEAD
  ///
  /// Works on an unborn branch too (fresh repository without commits).
  pub fn current_branch(&self) -> ShipResult<Option<String>> {
    let output = self
      .git_cmd()
      .args(["symbolic-ref", "--quiet", "--short", "HEAD"])
      .output()
      .context("Failed to get current branch")?;

    if !output.status.success() {
      return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
  }

  /// Run a git command and fail on a non-zero exit
  pub(crate) fn run(&self, args: &[&str]) -> ShipResult<Output> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(ShipError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the working tree
  /// - Clears environment variables except `PASSTHROUGH_ENV`
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.work_tree);

    // Isolated environment (don't trust global GIT_* overrides)
    cmd.env_clear();
    cmd.envs(self.env.iter().map(|(key, value)| (*key, value.as_str())));

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    debug!(cwd = %self.work_tree.display(), "git command prepared");
    cmd
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn git(cwd: &Path, args: &[&str]) {
    let status = Command::new("git").current_dir(cwd).args(args).output().unwrap();
    assert!(status.status.success(), "git {:?} failed", args);
  }

  fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--initial-branch=main"]);
    git(dir.path(), &["config", "user.name", "Test User"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    dir
  }

  #[test]
  fn test_open_rejects_non_repo() {
    let dir = TempDir::new().unwrap();
    let err = SystemGit::open(dir.path()).err().unwrap();
    assert!(matches!(err, ShipError::Git(GitError::RepoNotFound { .. })));
  }

  #[test]
  fn test_branch_on_unborn_and_detached_head() {
    let dir = init_repo();
    let git_repo = SystemGit::open(dir.path()).unwrap();
    assert_eq!(git_repo.current_branch().unwrap().as_deref(), Some("main"));

    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "init"]);
    let head = git_repo.head_commit().unwrap();
    assert_eq!(head.len(), 40);
    assert!(head.starts_with(&git_repo.short_head().unwrap()));

    git(dir.path(), &["checkout", "--detach"]);
    assert_eq!(git_repo.current_branch().unwrap(), None);
  }

  #[test]
  fn test_passthrough_env_keeps_only_known_keys() {
    let env = passthrough_env(|key| match key {
      "HOME" => Some("/home/ci".to_string()),
      "GIT_AUTHOR_NAME" => Some("Release Bot".to_string()),
      "GIT_DIR" => Some("/elsewhere".to_string()),
      _ => None,
    });
    assert_eq!(
      env,
      vec![("HOME", "/home/ci".to_string()), ("GIT_AUTHOR_NAME", "Release Bot".to_string())]
    );
  }

  #[test]
  fn test_run_reports_failed_command() {
    let dir = init_repo();
    let git_repo = SystemGit::open(dir.path()).unwrap();
    let err = git_repo.run(&["rev-parse", "--verify", "refs/heads/nope"]).unwrap_err();
    assert!(err.to_string().contains("git rev-parse --verify refs/heads/nope"));
  }
}
