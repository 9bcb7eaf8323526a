//! Release-facing operations for SystemGit (status, tags, commits, pushes)

use super::system_git::SystemGit;
use crate::core::error::{GitError, ResultExt, ShipError, ShipResult};
use crate::utils::path_to_git_format;
use std::path::PathBuf;
use tracing::debug;

/// Outcome of an attempt to create a tag
#[derive(Debug, PartialEq, Eq)]
pub enum TagCreation {
  Created,
  AlreadyExists,
}

impl SystemGit {
  /// Paths that are modified, staged, or untracked
  ///
  /// Runs with `--no-optional-locks` so that reading status never refreshes
  /// (rewrites) the index.
  pub fn dirty_paths(&self) -> ShipResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["--no-optional-locks", "status", "--porcelain=v1", "--untracked-files=all"])
      .output()
      .context("Failed to run git status")?;

    if !output.status.success() {
      return Err(ShipError::Git(GitError::CommandFailed {
        command: "git status --porcelain".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(parse_porcelain(&String::from_utf8_lossy(&output.stdout)))
  }

  /// Check whether a local tag exists
  pub fn tag_exists(&self, name: &str) -> ShipResult<bool> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &format!("refs/tags/{}", name)])
      .output()
      .context("Failed to look up tag")?;

    Ok(output.status.success())
  }

  /// Stage the given paths and commit exactly those paths
  ///
  /// The pathspec makes git commit only these paths, even when other changes
  /// are already staged.
  pub fn commit_paths(&self, message: &str, paths: &[PathBuf]) -> ShipResult<String> {
    if paths.is_empty() {
      return Err(ShipError::message("Refusing to create a commit without paths"));
    }

    let specs: Vec<String> = paths.iter().map(|p| path_to_git_format(p)).collect();

    let mut add = vec!["add", "--"];
    add.extend(specs.iter().map(String::as_str));
    self.run(&add)?;

    let mut commit = vec!["commit", "--no-verify", "-m", message, "--"];
    commit.extend(specs.iter().map(String::as_str));
    self.run(&commit)?;

    let sha = self.head_commit()?;
    debug!(sha = %sha, files = specs.len(), "created release commit");
    Ok(sha)
  }

  /// Create an annotated (optionally signed) tag on a commit
  ///
  /// Never overwrites: an existing tag yields `TagCreation::AlreadyExists`.
  pub fn create_annotated_tag(&self, name: &str, message: &str, target: &str, sign: bool) -> ShipResult<TagCreation> {
    if self.tag_exists(name)? {
      return Ok(TagCreation::AlreadyExists);
    }

    let mode = if sign { "-s" } else { "-a" };
    let output = self
      .git_cmd()
      .args(["tag", mode, name, "-m", message, target])
      .output()
      .context("Failed to run git tag")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("already exists") {
        return Ok(TagCreation::AlreadyExists);
      }
      return Err(ShipError::Git(GitError::CommandFailed {
        command: format!("git tag {} {}", mode, name),
        stderr: stderr.to_string(),
      }));
    }

    debug!(tag = name, target = target, "created tag");
    Ok(TagCreation::Created)
  }

  /// Push a single refspec to a remote
  pub fn push_ref(&self, remote: &str, refspec: &str) -> ShipResult<()> {
    debug!(remote = remote, refspec = refspec, "pushing");
    self.run(&["push", remote, refspec])?;
    Ok(())
  }
}

/// Parse `git status --porcelain=v1` output into paths
///
/// Renames report the destination path.
fn parse_porcelain(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .filter(|line| line.len() > 3)
    .map(|line| {
      let path = &line[3..];
      match path.split_once(" -> ") {
        Some((_, to)) => to.to_string(),
        None => path.to_string(),
      }
    })
    .collect()
}
