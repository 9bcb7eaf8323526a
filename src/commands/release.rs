//! Release command implementation
//!
//! Runs the pipeline and turns its outcome into terminal output (or one JSON
//! document with `--json`) and an exit code.

use crate::core::error::{ExitCode, ShipError, print_error};
use crate::release::inspect::PreconditionFailure;
use crate::release::pipeline::{self, ReleaseOptions, ReleaseOutcome, ReleaseSummary, StdinConfirm};
use serde_json::json;

/// Run a release and report its outcome
pub fn run_release(opts: ReleaseOptions, json: bool) -> ExitCode {
  let outcome = pipeline::run(&opts, &mut StdinConfirm);

  if json {
    print_json(&outcome);
  } else {
    print_outcome(&outcome);
  }

  exit_code(&outcome)
}

/// Exit code for an outcome: 0 for a completed release or a dry-run report
pub fn exit_code(outcome: &ReleaseOutcome) -> ExitCode {
  if outcome.is_success() {
    ExitCode::Success
  } else {
    ExitCode::Failure
  }
}

fn print_outcome(outcome: &ReleaseOutcome) {
  match outcome {
    ReleaseOutcome::Completed(summary) => print_summary(summary),
    ReleaseOutcome::DryRunReport(plan) => {
      println!();
      print!("{}", plan.to_human_readable());
      println!("\nDRY RUN: nothing was changed. Re-run without --dry-run to release.");
    }
    ReleaseOutcome::AbortedByUser => {
      println!("🛑 Release aborted. Nothing was changed.");
    }
    ReleaseOutcome::AbortedByPrecondition(failures) => print_blocked(failures),
    ReleaseOutcome::FailedAtStage { stage, cause } => {
      eprintln!("\n❌ Release failed at stage '{}'", stage);
      print_error(cause);
    }
  }
}

fn print_summary(summary: &ReleaseSummary) {
  let short = summary.marker.commit.chars().take(7).collect::<String>();

  println!();
  println!("🎉 Released {} as {} ({})", summary.version, summary.marker.name, short);
  println!("   Version code: {}", summary.version_code);
  if summary.prerelease {
    println!("   Pre-release: yes");
  }
  println!("   Verification: {}", summary.verification.summary());
  if !summary.verification.fully_verified() {
    println!("   ⚠️  Released with skipped verification (recorded in the marker)");
  }
  for failure in &summary.overridden {
    println!("   ⚠️  Overridden: {}", failure);
  }
  if !summary.artifacts.is_empty() {
    println!("   Expected artifacts:");
    for artifact in &summary.artifacts {
      println!("     - {}", artifact);
    }
  }
}

fn print_blocked(failures: &[PreconditionFailure]) {
  eprintln!("\n❌ Release blocked before any change was made:");
  for failure in failures {
    eprintln!("   - {}", failure);
  }
  eprintln!("\n💡 Help: Release markers are never reused or overwritten. Choose a new version.\n");
}

fn print_json(outcome: &ReleaseOutcome) {
  let value = match outcome {
    ReleaseOutcome::Completed(summary) => json!({ "outcome": "completed", "release": summary }),
    ReleaseOutcome::DryRunReport(plan) => json!({ "outcome": "dry-run-report", "plan": plan }),
    ReleaseOutcome::AbortedByUser => json!({ "outcome": "aborted-by-user" }),
    ReleaseOutcome::AbortedByPrecondition(failures) => {
      json!({ "outcome": "aborted-by-precondition", "failures": failures })
    }
    ReleaseOutcome::FailedAtStage { stage, cause } => json!({
      "outcome": "failed-at-stage",
      "stage": stage,
      "error": cause.to_string(),
      "help": cause.help_message(),
    }),
  };

  match serde_json::to_string_pretty(&value) {
    Ok(text) => println!("{}", text),
    Err(e) => print_error(&ShipError::from(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::VersionError;
  use crate::core::plan::ReleasePlan;
  use crate::release::pipeline::FailureStage;

  #[test]
  fn test_exit_codes() {
    let dry_run = ReleaseOutcome::DryRunReport(Box::new(ReleasePlan::new("1.0.0", 10000, "v1.0.0")));
    assert_eq!(exit_code(&dry_run), ExitCode::Success);
    assert_eq!(exit_code(&ReleaseOutcome::AbortedByUser), ExitCode::Failure);
    assert_eq!(
      exit_code(&ReleaseOutcome::AbortedByPrecondition(vec![PreconditionFailure::MarkerExists {
        name: "v1.0.0".to_string()
      }])),
      ExitCode::Failure
    );
    assert_eq!(
      exit_code(&ReleaseOutcome::FailedAtStage {
        stage: FailureStage::Validation,
        cause: ShipError::Version(VersionError::Empty),
      }),
      ExitCode::Failure
    );
  }
}
