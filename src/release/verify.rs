//! Verification gate: test suite and local build check
//!
//! Commands are argv arrays from `[verify]` in release.toml, run from the
//! repository root with inherited stdio. A stage is skipped when its flag is set
//! or when no command is configured; skips are kept in the report so a release
//! cut without them is visible in the marker annotation.

use crate::core::config::VerifyConfig;
use crate::core::error::VerificationFailure;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Verification sub-stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyStage {
  Tests,
  BuildCheck,
}

impl VerifyStage {
  /// Stages in execution order
  pub const ALL: [VerifyStage; 2] = [VerifyStage::Tests, VerifyStage::BuildCheck];
}

impl fmt::Display for VerifyStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VerifyStage::Tests => write!(f, "tests"),
      VerifyStage::BuildCheck => write!(f, "build-check"),
    }
  }
}

/// What happened (or will happen) to a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum StageStatus {
  /// Will run (plans and dry-runs)
  Pending,
  Passed,
  Skipped(String),
}

/// One stage with its command and status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage: VerifyStage,
  pub command: Vec<String>,
  pub status: StageStatus,
}

impl StageReport {
  pub fn command_line(&self) -> String {
    self.command.join(" ")
  }
}

/// Outcome of the verification gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
  pub stages: Vec<StageReport>,
}

impl VerificationReport {
  /// True when no stage was skipped
  pub fn fully_verified(&self) -> bool {
    self.stages.iter().all(|s| !matches!(s.status, StageStatus::Skipped(_)))
  }

  /// One-line summary, e.g. `tests: passed, build-check: skipped (--skip-build)`
  pub fn summary(&self) -> String {
    self
      .stages
      .iter()
      .map(|s| match &s.status {
        StageStatus::Pending => format!("{}: pending", s.stage),
        StageStatus::Passed => format!("{}: passed", s.stage),
        StageStatus::Skipped(reason) => format!("{}: skipped ({})", s.stage, reason),
      })
      .collect::<Vec<_>>()
      .join(", ")
  }
}

/// Which stages are skipped by flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
  pub tests: bool,
  pub build: bool,
}

/// Decide, without running anything, what each stage will do
pub fn plan(config: &VerifyConfig, skip: SkipFlags) -> VerificationReport {
  let stages = VerifyStage::ALL
    .into_iter()
    .map(|stage| {
      let (command, skipped_by_flag, flag) = match stage {
        VerifyStage::Tests => (&config.tests, skip.tests, "--skip-tests"),
        VerifyStage::BuildCheck => (&config.build_check, skip.build, "--skip-build"),
      };

      let status = if skipped_by_flag {
        StageStatus::Skipped(flag.to_string())
      } else if command.is_empty() {
        StageStatus::Skipped("no command configured".to_string())
      } else {
        StageStatus::Pending
      };

      StageReport {
        stage,
        command: command.clone(),
        status,
      }
    })
    .collect();

  VerificationReport { stages }
}

/// Run every pending stage in order, stopping at the first failure
///
/// With `quiet` set, progress lines are suppressed and the commands' stdout is
/// sent to stderr, keeping stdout free for machine-readable output.
pub fn run(
  root: &Path,
  config: &VerifyConfig,
  skip: SkipFlags,
  quiet: bool,
) -> Result<VerificationReport, VerificationFailure> {
  let mut report = plan(config, skip);

  for stage in &mut report.stages {
    if stage.status != StageStatus::Pending {
      info!(stage = %stage.stage, status = ?stage.status, "verification stage skipped");
      continue;
    }

    if !quiet {
      println!("🧪 Running {}: {}", stage.stage, stage.command_line());
    }
    run_stage(root, stage, quiet)?;
    if !quiet {
      println!("✅ {} passed", stage.stage);
    }
    stage.status = StageStatus::Passed;
  }

  Ok(report)
}

fn run_stage(root: &Path, stage: &StageReport, quiet: bool) -> Result<(), VerificationFailure> {
  let (program, args) = match stage.command.split_first() {
    Some(split) => split,
    None => {
      return Err(VerificationFailure::Spawn {
        stage: stage.stage,
        command: String::new(),
        reason: "empty command".to_string(),
      });
    }
  };

  debug!(stage = %stage.stage, cwd = %root.display(), command = %stage.command_line(), "spawning verification command");

  let mut cmd = Command::new(program);
  cmd.args(args).current_dir(root);
  if quiet {
    cmd.stdout(Stdio::from(std::io::stderr()));
  }

  let status = cmd
    .status()
    .map_err(|e| VerificationFailure::Spawn {
      stage: stage.stage,
      command: stage.command_line(),
      reason: e.to_string(),
    })?;

  if !status.success() {
    return Err(VerificationFailure::StageFailed {
      stage: stage.stage,
      command: stage.command_line(),
      code: status.code(),
    });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn config(tests: &[&str], build_check: &[&str]) -> VerifyConfig {
    VerifyConfig {
      tests: tests.iter().map(|s| s.to_string()).collect(),
      build_check: build_check.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn test_plan_records_skip_reasons() {
    let report = plan(&config(&["npm", "test"], &[]), SkipFlags::default());
    assert_eq!(report.stages[0].status, StageStatus::Pending);
    assert_eq!(
      report.stages[1].status,
      StageStatus::Skipped("no command configured".to_string())
    );

    let report = plan(
      &config(&["npm", "test"], &["npm", "run", "build"]),
      SkipFlags { tests: true, build: false },
    );
    assert_eq!(report.stages[0].status, StageStatus::Skipped("--skip-tests".to_string()));
    assert!(!report.fully_verified());
  }

  #[test]
  fn test_run_passes_and_summarizes() {
    let dir = TempDir::new().unwrap();
    let report = run(dir.path(), &config(&["true"], &["true"]), SkipFlags::default(), true).unwrap();
    assert!(report.fully_verified());
    assert_eq!(report.summary(), "tests: passed, build-check: passed");
  }

  #[test]
  fn test_build_check_failure_is_named() {
    let dir = TempDir::new().unwrap();
    let err = run(dir.path(), &config(&["true"], &["false"]), SkipFlags::default(), true).unwrap_err();
    assert_eq!(err.stage(), VerifyStage::BuildCheck);
    assert!(matches!(err, VerificationFailure::StageFailed { code: Some(1), .. }));
  }

  #[test]
  fn test_failure_stops_before_next_stage() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("build-ran");
    let touch = format!("touch {}", marker.display());
    let err = run(dir.path(), &config(&["false"], &["sh", "-c", &touch]), SkipFlags::default(), true).unwrap_err();
    assert_eq!(err.stage(), VerifyStage::Tests);
    assert!(!marker.exists());
  }

  #[test]
  fn test_missing_program_is_spawn_failure() {
    let dir = TempDir::new().unwrap();
    let err = run(
      dir.path(),
      &config(&["definitely-not-a-real-program-vership"], &[]),
      SkipFlags::default(),
      true,
    )
    .unwrap_err();
    assert!(matches!(err, VerificationFailure::Spawn { stage: VerifyStage::Tests, .. }));
  }

  #[test]
  fn test_skipped_summary() {
    let dir = TempDir::new().unwrap();
    let report = run(
      dir.path(),
      &config(&["true"], &["true"]),
      SkipFlags { tests: false, build: true },
      false,
    )
    .unwrap();
    assert_eq!(report.summary(), "tests: passed, build-check: skipped (--skip-build)");
  }
}
