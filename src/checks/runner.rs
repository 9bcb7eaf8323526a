//! Check runner for executing release preconditions

use super::trait_def::{Check, CheckContext, CheckResult};
use std::sync::Arc;
use tracing::debug;

/// Check runner that executes multiple checks
pub struct CheckRunner {
  checks: Vec<Arc<dyn Check>>,
}

impl CheckRunner {
  /// Create a new check runner
  pub fn new() -> Self {
    Self { checks: Vec::new() }
  }

  /// Add a check to the runner
  pub fn add_check(&mut self, check: Arc<dyn Check>) {
    self.checks.push(check);
  }

  /// Run all checks in registration order and collect results
  pub fn run_all(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
    self
      .checks
      .iter()
      .map(|check| {
        let result = check.run(ctx);
        debug!(
          check = check.name(),
          description = check.description(),
          passed = result.passed,
          severity = %result.severity,
          "precondition evaluated"
        );
        result
      })
      .collect()
  }
}

impl Default for CheckRunner {
  fn default() -> Self {
    Self::new()
  }
}

/// Create a runner with every release precondition
///
/// Marker uniqueness runs first so a duplicate release is reported before
/// anything the operator could override.
pub fn create_release_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();

  runner.add_check(Arc::new(super::marker::MarkerUniqueCheck));
  runner.add_check(Arc::new(super::clean_tree::CleanTreeCheck));
  runner.add_check(Arc::new(super::branch::BranchCheck));
  runner.add_check(Arc::new(super::prerelease::PrereleaseFlagCheck));

  runner
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::release::inspect::RepositoryState;
  use crate::release::version::Version;

  #[test]
  fn test_release_runner_order() {
    let state = RepositoryState {
      dirty_paths: Vec::new(),
      branch: Some("main".to_string()),
      marker_name: "v1.0.0".to_string(),
      marker_exists: false,
      current_version: None,
    };
    let version = Version::parse("1.0.0").unwrap();
    let branches = vec!["main".to_string()];
    let ctx = CheckContext {
      state: &state,
      version: &version,
      canonical_branches: &branches,
      prerelease: false,
    };

    let results = create_release_runner().run_all(&ctx);
    let names: Vec<&str> = results.iter().map(|r| r.check_name.as_str()).collect();
    assert_eq!(names, vec!["marker-unique", "clean-tree", "canonical-branch", "prerelease-flag"]);
  }
}
