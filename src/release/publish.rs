//! Publisher: release commit, annotated marker, pushes
//!
//! Steps run strictly in order and each one only after the previous succeeded.
//! Nothing is retried or rolled back; a failed push leaves the local commit and
//! marker in place and the error tells the operator what to verify.

use crate::core::error::PublishFailure;
use crate::core::vcs::{SystemGit, TagCreation};
use crate::release::verify::VerificationReport;
use crate::release::version::Version;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Everything the publisher needs besides the version and the changed paths
#[derive(Debug, Clone)]
pub struct PublishContext<'a> {
  pub remote: &'a str,
  /// Branch to push; `None` on a detached HEAD (branch push is skipped)
  pub branch: Option<&'a str>,
  pub commit_message: String,
  pub sign: bool,
  pub prerelease: bool,
  pub verification: &'a VerificationReport,
  pub artifacts: Vec<String>,
  /// Suppress progress lines (JSON output mode)
  pub quiet: bool,
}

/// A published release marker
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseMarker {
  pub name: String,
  /// Commit the marker is bound to
  pub commit: String,
  /// Whether a new release commit was created (false when descriptors were already current)
  pub created_commit: bool,
  pub branch_pushed: bool,
  pub annotation: String,
}

/// Commit, tag and push a release
pub fn publish(
  git: &SystemGit,
  version: &Version,
  changed_paths: &[PathBuf],
  ctx: &PublishContext<'_>,
) -> Result<ReleaseMarker, PublishFailure> {
  let name = version.marker_name();
  let say = |line: String| {
    if !ctx.quiet {
      println!("{}", line);
    }
  };

  // 1. Commit exactly the changed descriptors (or bind to HEAD when nothing changed)
  let created_commit = !changed_paths.is_empty();
  let commit = if created_commit {
    say(format!("📝 Committing {} descriptor(s)", changed_paths.len()));
    git
      .commit_paths(&ctx.commit_message, changed_paths)
      .map_err(|e| PublishFailure::Commit { reason: e.to_string() })?
  } else {
    say(format!("📝 Descriptors already at {}, tagging current HEAD", version));
    git
      .head_commit()
      .map_err(|e| PublishFailure::Commit { reason: e.to_string() })?
  };
  let short = git.short_head().unwrap_or_else(|_| commit.chars().take(7).collect());
  info!(commit = %short, created_commit, "release commit ready");

  // 2. Annotated marker
  let annotation = annotation(version, &now(), ctx, &short);
  match git.create_annotated_tag(&name, &annotation, &commit, ctx.sign) {
    Ok(TagCreation::Created) => say(format!("🏷️  Created marker {} on {}", name, short)),
    Ok(TagCreation::AlreadyExists) => return Err(PublishFailure::MarkerExists { name }),
    Err(e) => {
      return Err(PublishFailure::Tag {
        name,
        reason: e.to_string(),
      });
    }
  }

  // 3. Branch
  let branch_pushed = match ctx.branch {
    Some(branch) => {
      git
        .push_ref(ctx.remote, &format!("refs/heads/{}", branch))
        .map_err(|e| PublishFailure::PushBranch {
          remote: ctx.remote.to_string(),
          branch: branch.to_string(),
          marker: name.clone(),
          reason: e.to_string(),
        })?;
      say(format!("⬆️  Pushed {} to {}", branch, ctx.remote));
      true
    }
    None => {
      say("⚠️  Detached HEAD: no branch to push, pushing the marker only".to_string());
      false
    }
  };

  // 4. Marker (the downstream build trigger)
  git
    .push_ref(ctx.remote, &format!("refs/tags/{}", name))
    .map_err(|e| PublishFailure::PushMarker {
      remote: ctx.remote.to_string(),
      marker: name.clone(),
      reason: e.to_string(),
    })?;
  say(format!("⬆️  Pushed marker {} to {}", name, ctx.remote));
  info!(marker = %name, remote = ctx.remote, "release published");

  Ok(ReleaseMarker {
    name,
    commit,
    created_commit,
    branch_pushed,
    annotation,
  })
}

fn now() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Marker annotation payload
pub fn annotation(version: &Version, timestamp: &str, ctx: &PublishContext<'_>, short_commit: &str) -> String {
  let mut out = format!("Release {}\n\n", version);
  out.push_str(&format!("version: {}\n", version));
  out.push_str(&format!("version-code: {}\n", version.encode()));
  out.push_str(&format!("date: {}\n", timestamp));
  out.push_str(&format!("branch: {}\n", ctx.branch.unwrap_or("(detached)")));
  out.push_str(&format!("commit: {}\n", short_commit));
  out.push_str(&format!("prerelease: {}\n", ctx.prerelease));
  out.push_str(&format!("verification: {}\n", ctx.verification.summary()));
  if !ctx.verification.fully_verified() {
    out.push_str("verified: partial\n");
  }
  if !ctx.artifacts.is_empty() {
    out.push_str("artifacts:\n");
    for artifact in &ctx.artifacts {
      out.push_str(&format!("  - {}\n", artifact));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::release::verify::{StageReport, StageStatus, VerifyStage};
  use std::path::Path;
  use std::process::Command;
  use tempfile::TempDir;

  fn git(cwd: &Path, args: &[&str]) -> String {
    let out = Command::new("git").current_dir(cwd).args(args).output().unwrap();
    assert!(out.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).trim().to_string()
  }

  /// Working repository on main with a bare `origin`
  fn repo_with_remote() -> (TempDir, TempDir) {
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--bare", "--initial-branch=main"]);

    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--initial-branch=main"]);
    git(dir.path(), &["config", "user.name", "Test User"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    std::fs::write(dir.path().join("package.json"), "{\"version\": \"1.0.0\"}\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "init"]);
    git(dir.path(), &["remote", "add", "origin", &remote.path().to_string_lossy()]);
    (dir, remote)
  }

  fn report() -> VerificationReport {
    VerificationReport {
      stages: vec![
        StageReport {
          stage: VerifyStage::Tests,
          command: vec!["npm".to_string(), "test".to_string()],
          status: StageStatus::Passed,
        },
        StageReport {
          stage: VerifyStage::BuildCheck,
          command: Vec::new(),
          status: StageStatus::Skipped("--skip-build".to_string()),
        },
      ],
    }
  }

  fn ctx<'a>(verification: &'a VerificationReport, branch: Option<&'a str>, remote: &'a str) -> PublishContext<'a> {
    PublishContext {
      remote,
      branch,
      commit_message: "chore(release): v2.1.0".to_string(),
      sign: false,
      prerelease: false,
      verification,
      artifacts: vec!["app-release-2.1.0.apk".to_string()],
      quiet: true,
    }
  }

  #[test]
  fn test_annotation_records_skips_and_artifacts() {
    let verification = report();
    let version = Version::parse("2.1.0").unwrap();
    let text = annotation(
      &version,
      "2026-01-01T00:00:00Z",
      &ctx(&verification, Some("main"), "origin"),
      "abc1234",
    );
    assert!(text.starts_with("Release 2.1.0\n\n"));
    assert!(text.contains("version-code: 20100\n"));
    assert!(text.contains("branch: main\n"));
    assert!(text.contains("commit: abc1234\n"));
    assert!(text.contains("verification: tests: passed, build-check: skipped (--skip-build)\n"));
    assert!(text.contains("verified: partial\n"));
    assert!(text.contains("  - app-release-2.1.0.apk\n"));
  }

  #[test]
  fn test_publish_commits_tags_and_pushes() {
    let (dir, remote) = repo_with_remote();
    std::fs::write(dir.path().join("package.json"), "{\"version\": \"2.1.0\"}\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not part of the release").unwrap();

    let repo = SystemGit::open(dir.path()).unwrap();
    let before = repo.head_commit().unwrap();
    let verification = report();
    let marker = publish(
      &repo,
      &Version::parse("2.1.0").unwrap(),
      &[PathBuf::from("package.json")],
      &ctx(&verification, Some("main"), "origin"),
    )
    .unwrap();

    assert_eq!(marker.name, "v2.1.0");
    assert!(marker.created_commit);
    assert!(marker.branch_pushed);
    assert_ne!(marker.commit, before);
    assert_eq!(git(dir.path(), &["log", "-1", "--format=%s"]), "chore(release): v2.1.0");
    assert_eq!(git(dir.path(), &["rev-parse", "v2.1.0^{commit}"]), marker.commit);
    assert_eq!(git(dir.path(), &["cat-file", "-t", "v2.1.0"]), "tag");

    // Only the descriptor went into the commit
    assert_eq!(git(dir.path(), &["status", "--porcelain"]), "?? notes.txt");

    // Remote has both the branch and the marker
    assert_eq!(git(remote.path(), &["rev-parse", "refs/heads/main"]), marker.commit);
    assert_eq!(git(remote.path(), &["rev-parse", "v2.1.0^{commit}"]), marker.commit);
  }

  #[test]
  fn test_publish_without_changes_tags_head() {
    let (dir, _remote) = repo_with_remote();
    let repo = SystemGit::open(dir.path()).unwrap();
    let head = repo.head_commit().unwrap();

    let verification = report();
    let marker = publish(
      &repo,
      &Version::parse("1.0.0").unwrap(),
      &[],
      &ctx(&verification, Some("main"), "origin"),
    )
    .unwrap();

    assert!(!marker.created_commit);
    assert_eq!(marker.commit, head);
  }

  #[test]
  fn test_existing_marker_is_never_overwritten() {
    let (dir, _remote) = repo_with_remote();
    git(dir.path(), &["tag", "-a", "v1.0.0", "-m", "earlier"]);
    let repo = SystemGit::open(dir.path()).unwrap();

    let verification = report();
    let err = publish(
      &repo,
      &Version::parse("1.0.0").unwrap(),
      &[],
      &ctx(&verification, Some("main"), "origin"),
    )
    .unwrap_err();

    assert_eq!(
      err,
      PublishFailure::MarkerExists {
        name: "v1.0.0".to_string()
      }
    );
    assert!(git(dir.path(), &["tag", "-n1", "-l", "v1.0.0"]).contains("earlier"));
  }

  #[test]
  fn test_push_failure_keeps_local_marker() {
    let (dir, _remote) = repo_with_remote();
    std::fs::write(dir.path().join("package.json"), "{\"version\": \"2.1.0\"}\n").unwrap();
    let repo = SystemGit::open(dir.path()).unwrap();

    let verification = report();
    let err = publish(
      &repo,
      &Version::parse("2.1.0").unwrap(),
      &[PathBuf::from("package.json")],
      &ctx(&verification, Some("main"), "nowhere"),
    )
    .unwrap_err();

    assert!(matches!(err, PublishFailure::PushBranch { .. }), "{:?}", err);
    assert!(repo.tag_exists("v2.1.0").unwrap());
  }

  #[cfg(unix)]
  #[test]
  fn test_rejected_marker_push_after_branch_push() {
    use crate::core::error::ShipError;
    use std::os::unix::fs::PermissionsExt;

    let (dir, remote) = repo_with_remote();
    std::fs::create_dir_all(remote.path().join("hooks")).unwrap();
    let hook = remote.path().join("hooks").join("pre-receive");
    std::fs::write(
      &hook,
      "#!/bin/sh\nwhile read old new ref; do\n  case \"$ref\" in\n    refs/tags/*) echo \"tags are frozen\" >&2; exit 1 ;;\n  esac\ndone\nexit 0\n",
    )
    .unwrap();
    std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).unwrap();

    std::fs::write(dir.path().join("package.json"), "{\"version\": \"2.1.0\"}\n").unwrap();
    let repo = SystemGit::open(dir.path()).unwrap();

    let verification = report();
    let err = publish(
      &repo,
      &Version::parse("2.1.0").unwrap(),
      &[PathBuf::from("package.json")],
      &ctx(&verification, Some("main"), "origin"),
    )
    .unwrap_err();

    assert!(matches!(err, PublishFailure::PushMarker { .. }), "{:?}", err);
    assert!(repo.tag_exists("v2.1.0").unwrap());

    // The branch made it, the marker did not
    let head = repo.head_commit().unwrap();
    assert_eq!(git(remote.path(), &["rev-parse", "refs/heads/main"]), head);
    assert_eq!(git(remote.path(), &["tag", "-l"]), "");

    let help = ShipError::from(err).help_message().unwrap();
    assert!(help.contains("Verify remote state manually"), "{}", help);
    assert!(help.contains("git push origin refs/tags/v2.1.0"), "{}", help);
  }
}
