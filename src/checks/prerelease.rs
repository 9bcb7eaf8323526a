//! Pre-release flag consistency

use super::trait_def::{Check, CheckContext, CheckResult};

/// Notes a mismatch between `--prerelease` and the version's label
///
/// Never blocks: the flag only changes what the marker annotation records.
pub struct PrereleaseFlagCheck;

impl Check for PrereleaseFlagCheck {
  fn name(&self) -> &str {
    "prerelease-flag"
  }

  fn description(&self) -> &str {
    "Compares the --prerelease flag with the version label"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
    match (ctx.prerelease, ctx.version.is_prerelease()) {
      (true, false) => CheckResult::note(
        self.name(),
        format!("{} has no pre-release label but --prerelease was given", ctx.version),
      ),
      (false, true) => CheckResult::note(
        self.name(),
        format!(
          "{} carries the pre-release label '{}' but --prerelease was not given",
          ctx.version,
          ctx.version.label().unwrap_or_default()
        ),
      ),
      _ => CheckResult::pass(self.name(), "Pre-release flag matches the version"),
    }
  }
}
