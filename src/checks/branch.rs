//! Canonical release branch

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::release::inspect::PreconditionFailure;

/// Warns when HEAD is not on one of the canonical branches (detached HEAD included)
pub struct BranchCheck;

impl Check for BranchCheck {
  fn name(&self) -> &str {
    "canonical-branch"
  }

  fn description(&self) -> &str {
    "Validates that the release is cut from a canonical branch"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
    if let Some(branch) = &ctx.state.branch
      && ctx.canonical_branches.iter().any(|b| b == branch)
    {
      return CheckResult::pass(self.name(), format!("On branch {}", branch));
    }

    CheckResult::fail(
      self.name(),
      PreconditionFailure::NonCanonicalBranch {
        current: ctx.state.branch.clone(),
        expected: ctx.canonical_branches.to_vec(),
      },
      Some(format!(
        "Switch to {} (git switch {}), or pass --force to release from here",
        ctx.canonical_branches.join(" or "),
        ctx.canonical_branches.first().map(String::as_str).unwrap_or("main")
      )),
    )
  }
}
