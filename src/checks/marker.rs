//! Release marker uniqueness

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::release::inspect::PreconditionFailure;

/// Fails when the marker for the candidate version already exists
pub struct MarkerUniqueCheck;

impl Check for MarkerUniqueCheck {
  fn name(&self) -> &str {
    "marker-unique"
  }

  fn description(&self) -> &str {
    "Validates that no release marker exists for this version"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
    let name = ctx.version.marker_name();

    if ctx.state.marker_exists {
      return CheckResult::fail(
        self.name(),
        PreconditionFailure::MarkerExists { name: name.clone() },
        Some(format!(
          "Version {} has already been released. Pick a new version; inspect the old one with `git show {}`.",
          ctx.version, name
        )),
      );
    }

    CheckResult::pass(self.name(), format!("{} is unused", name))
  }
}
