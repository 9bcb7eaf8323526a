//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const PACKAGE_JSON: &str = r#"{
  "name": "demo-app",
  "version": "1.0.0",
  "private": true,
  "scripts": {
    "test": "jest"
  }
}
"#;

pub const BUILD_GRADLE: &str = r#"android {
    compileSdkVersion 34

    defaultConfig {
        applicationId "com.example.demo"
        minSdkVersion 24
        versionCode 10000
        versionName "1.0.0"
    }
}
"#;

/// A project checked out on `main`, pushed to a bare `origin` remote
pub struct TestRepo {
  _root: TempDir,
  _remote: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestRepo {
  /// Create a repo whose build check succeeds
  pub fn new() -> Result<Self> {
    Self::with_build_check("true")
  }

  /// Create a repo with the given build check command (`true` or `false`)
  pub fn with_build_check(build_check: &str) -> Result<Self> {
    let remote_dir = TempDir::new()?;
    let remote = remote_dir.path().to_path_buf();
    git(&remote, &["init", "--bare", "--initial-branch=main"])?;

    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(path.join("package.json"), PACKAGE_JSON)?;
    std::fs::create_dir_all(path.join("android/app"))?;
    std::fs::write(path.join("android/app/build.gradle"), BUILD_GRADLE)?;
    std::fs::write(
      path.join("release.toml"),
      format!(
        r#"remote = "origin"
canonical_branches = ["main"]

[verify]
tests = ["true"]
build_check = ["{}"]
"#,
        build_check
      ),
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial project setup"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;
    git(&path, &["push", "origin", "main"])?;

    Ok(Self {
      _root: root,
      _remote: remote_dir,
      path,
      remote,
    })
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Write a file without staging it
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(path), content)?;
    Ok(())
  }

  /// Tags in the local repository
  pub fn local_tags(&self) -> Result<Vec<String>> {
    lines(&git(&self.path, &["tag", "-l"])?)
  }

  /// Tags that reached the remote
  pub fn remote_tags(&self) -> Result<Vec<String>> {
    lines(&git(&self.remote, &["tag", "-l"])?)
  }

  /// Number of commits on the current branch
  pub fn commit_count(&self) -> Result<usize> {
    let output = git(&self.path, &["rev-list", "--count", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }

  /// Porcelain status lines, untracked files included
  pub fn status(&self) -> Result<Vec<String>> {
    lines(&git(&self.path, &["status", "--porcelain"])?)
  }
}

fn lines(output: &Output) -> Result<Vec<String>> {
  Ok(
    String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(String::from)
      .collect(),
  )
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the vership CLI with stdin closed; success is not asserted
pub fn run_vership(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_vership"))
    .current_dir(cwd)
    .args(args)
    .stdin(Stdio::null())
    .output()
    .context("Failed to run vership")
}

/// Run the vership CLI feeding `input` to the confirmation prompt
pub fn run_vership_with_stdin(cwd: &Path, args: &[&str], input: &str) -> Result<Output> {
  let mut child = Command::new(env!("CARGO_BIN_EXE_vership"))
    .current_dir(cwd)
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to spawn vership")?;

  if let Some(mut stdin) = child.stdin.take() {
    stdin.write_all(input.as_bytes())?;
  }

  child.wait_with_output().context("Failed to wait for vership")
}

/// Combined stdout and stderr, for assertions on messages
pub fn all_output(output: &Output) -> String {
  format!(
    "{}{}",
    String::from_utf8_lossy(&output.stdout),
    String::from_utf8_lossy(&output.stderr)
  )
}
