//! Check trait abstraction for release preconditions
//!
//! Each precondition is a `Check` that looks at an already collected
//! `RepositoryState`. Checks never run git themselves, so a failed inspection is
//! reported once (as an environment error) instead of once per check.
//!
//! Severity decides what a failed check means for the release:
//! - `Info`: a note for the report, never blocks
//! - `Warning`: blocks unless forced or confirmed by the operator
//! - `Error`: blocks, no flag overrides it

use crate::release::inspect::{PreconditionFailure, RepositoryState};
use crate::release::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Warning (overridable with --force or at the prompt)
  Warning,
  /// Error (fatal, never overridable)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warning => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// Result of running a check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
  /// Name of the check that ran
  pub check_name: String,
  /// Whether the check passed
  pub passed: bool,
  /// Severity level (if failed)
  pub severity: Severity,
  /// Human-readable message
  pub message: String,
  /// Optional suggested fix
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
  /// The precondition that failed, for Warning and Error results
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failure: Option<PreconditionFailure>,
}

impl CheckResult {
  /// Create a passing check result
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
      failure: None,
    }
  }

  /// Create a non-blocking note
  pub fn note(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
      failure: None,
    }
  }

  /// Create a failing check result; severity follows the failure
  pub fn fail(check_name: impl Into<String>, failure: PreconditionFailure, suggestion: Option<impl Into<String>>) -> Self {
    let severity = if failure.is_fatal() {
      Severity::Error
    } else {
      Severity::Warning
    };

    Self {
      check_name: check_name.into(),
      passed: false,
      severity,
      message: failure.to_string(),
      suggestion: suggestion.map(|s| s.into()),
      failure: Some(failure),
    }
  }
}

/// Context passed to checks
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
  /// Snapshot taken at the start of this invocation
  pub state: &'a RepositoryState,
  /// Candidate version
  pub version: &'a Version,
  /// Branches releases are expected to be cut from
  pub canonical_branches: &'a [String],
  /// Whether --prerelease was passed
  pub prerelease: bool,
}

/// Release precondition check
///
/// Checks can be run individually or in batch via the CheckRunner.
pub trait Check: Send + Sync {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  /// Run the check against the collected state
  fn run(&self, ctx: &CheckContext<'_>) -> CheckResult;
}
