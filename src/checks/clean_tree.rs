//! Working tree cleanliness

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::release::inspect::PreconditionFailure;

/// Warns when the working tree has modified, staged or untracked paths
pub struct CleanTreeCheck;

impl Check for CleanTreeCheck {
  fn name(&self) -> &str {
    "clean-tree"
  }

  fn description(&self) -> &str {
    "Validates that the working tree has no uncommitted changes"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
    if ctx.state.is_clean() {
      return CheckResult::pass(self.name(), "Working tree is clean");
    }

    CheckResult::fail(
      self.name(),
      PreconditionFailure::DirtyWorkingTree {
        paths: ctx.state.dirty_paths.clone(),
      },
      Some("Commit or stash your changes, or pass --force to release anyway"),
    )
  }
}
