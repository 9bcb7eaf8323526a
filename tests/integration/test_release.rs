//! Integration tests for `vership <VERSION>`

use crate::helpers::{TestRepo, all_output, run_vership, run_vership_with_stdin};
use anyhow::Result;

#[test]
fn test_release_completes_with_yes() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_vership(&repo.path, &["1.1.0", "--yes"])?;
  assert!(output.status.success(), "{}", all_output(&output));

  let package = repo.read_file("package.json")?;
  assert!(package.contains(r#""version": "1.1.0""#));
  assert!(package.contains(r#""test": "jest""#), "unrelated fields must survive");

  let gradle = repo.read_file("android/app/build.gradle")?;
  assert!(gradle.contains("versionCode 10100"));
  assert!(gradle.contains(r#"versionName "1.1.0""#));
  assert!(gradle.contains("minSdkVersion 24"));

  assert_eq!(repo.commit_count()?, 2);
  assert!(repo.status()?.is_empty(), "release commit must leave a clean tree");
  assert_eq!(repo.local_tags()?, vec!["v1.1.0"]);
  assert_eq!(repo.remote_tags()?, vec!["v1.1.0"]);

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Released 1.1.0 as v1.1.0"));

  Ok(())
}

#[test]
fn test_release_confirmed_on_stdin() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_vership_with_stdin(&repo.path, &["1.0.1"], "yes\n")?;
  assert!(output.status.success(), "{}", all_output(&output));
  assert_eq!(repo.remote_tags()?, vec!["v1.0.1"]);

  Ok(())
}

#[test]
fn test_declined_on_dirty_tree_changes_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_file("notes.txt", "scratch\n")?;

  let output = run_vership_with_stdin(&repo.path, &["1.1.0"], "n\n")?;
  assert_eq!(output.status.code(), Some(1));

  let text = all_output(&output);
  assert!(text.contains("notes.txt"), "dirty path should be listed: {}", text);
  assert!(text.contains("Release aborted"));

  assert!(repo.read_file("package.json")?.contains(r#""version": "1.0.0""#));
  assert_eq!(repo.commit_count()?, 1);
  assert!(repo.local_tags()?.is_empty());

  Ok(())
}

#[test]
fn test_closed_stdin_declines() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_vership(&repo.path, &["1.1.0"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(repo.local_tags()?.is_empty());
  assert!(repo.status()?.is_empty());

  Ok(())
}

#[test]
fn test_build_check_failure_leaves_edits_uncommitted() -> Result<()> {
  let repo = TestRepo::with_build_check("false")?;

  let output = run_vership(&repo.path, &["1.1.0", "--yes"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(all_output(&output).contains("build-check"));

  assert!(repo.read_file("package.json")?.contains(r#""version": "1.1.0""#));
  assert_eq!(repo.commit_count()?, 1);
  assert!(!repo.status()?.is_empty());
  assert!(repo.local_tags()?.is_empty());
  assert!(repo.remote_tags()?.is_empty());

  Ok(())
}

#[test]
fn test_skip_build_is_recorded_in_marker() -> Result<()> {
  let repo = TestRepo::with_build_check("false")?;

  let output = run_vership(&repo.path, &["1.1.0", "--yes", "--skip-build"])?;
  assert!(output.status.success(), "{}", all_output(&output));

  let annotation = crate::helpers::git(&repo.path, &["tag", "-l", "--format=%(contents)", "v1.1.0"])?;
  let annotation = String::from_utf8_lossy(&annotation.stdout);
  assert!(annotation.contains("verified: partial"), "{}", annotation);

  Ok(())
}

#[test]
fn test_existing_marker_blocks_even_with_force() -> Result<()> {
  let repo = TestRepo::new()?;
  crate::helpers::git(&repo.path, &["tag", "-a", "v1.1.0", "-m", "earlier"])?;

  let output = run_vership(&repo.path, &["1.1.0", "--force"])?;
  assert_eq!(output.status.code(), Some(1));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("v1.1.0"), "{}", stderr);

  assert!(repo.read_file("package.json")?.contains(r#""version": "1.0.0""#));
  assert_eq!(repo.commit_count()?, 1);
  assert!(repo.remote_tags()?.is_empty());

  Ok(())
}

#[test]
fn test_dry_run_has_no_side_effects() -> Result<()> {
  let repo = TestRepo::new()?;
  let package_before = repo.read_file("package.json")?;
  let gradle_before = repo.read_file("android/app/build.gradle")?;

  let output = run_vership(&repo.path, &["2.0.0", "--dry-run"])?;
  assert!(output.status.success(), "{}", all_output(&output));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("DRY RUN"));
  assert!(stdout.contains("v2.0.0"));
  assert!(stdout.contains("20000"));

  assert_eq!(repo.read_file("package.json")?, package_before);
  assert_eq!(repo.read_file("android/app/build.gradle")?, gradle_before);
  assert_eq!(repo.commit_count()?, 1);
  assert!(repo.local_tags()?.is_empty());
  assert!(repo.status()?.is_empty());

  Ok(())
}

#[test]
fn test_dry_run_json_is_parseable() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_vership(&repo.path, &["1.2.3-beta.1", "--dry-run", "--json"])?;
  assert!(output.status.success(), "{}", all_output(&output));

  let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(value["outcome"], "dry-run-report");
  assert_eq!(value["plan"]["version"], "1.2.3-beta.1");
  assert_eq!(value["plan"]["version_code"], 10203);
  assert!(value["plan"]["operations"].as_array().is_some_and(|ops| !ops.is_empty()));

  Ok(())
}

#[test]
fn test_invalid_version_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;

  for bad in ["v1.2.0", "1.2", "1.2.3+build.5"] {
    let output = run_vership(&repo.path, &[bad, "--yes"])?;
    assert_eq!(output.status.code(), Some(1), "{} should be rejected", bad);
  }

  assert!(repo.status()?.is_empty());
  assert!(repo.local_tags()?.is_empty());

  Ok(())
}
