//! Repository state inspection and release preconditions

use crate::adapters::adapter_for;
use crate::checks::{CheckContext, CheckResult, Severity, create_release_runner};
use crate::core::config::DescriptorConfig;
use crate::core::error::ShipResult;
use crate::core::vcs::SystemGit;
use crate::release::version::Version;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Paths listed in a dirty-tree message before it is cut short
const MAX_LISTED_PATHS: usize = 5;

/// Snapshot of the repository, taken once per invocation
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryState {
  /// Modified, staged and untracked paths
  pub dirty_paths: Vec<String>,
  /// Current branch, `None` on a detached HEAD
  pub branch: Option<String>,
  /// Marker name for the candidate version
  pub marker_name: String,
  /// Whether that marker exists locally
  pub marker_exists: bool,
  /// Version recorded in the first descriptor, when readable
  pub current_version: Option<String>,
}

impl RepositoryState {
  pub fn is_clean(&self) -> bool {
    self.dirty_paths.is_empty()
  }
}

/// Collect the repository state for a release of `version`
///
/// Errors here are environment errors (git missing, repository unreadable),
/// not precondition failures.
pub fn inspect(git: &SystemGit, version: &Version, descriptors: &[DescriptorConfig]) -> ShipResult<RepositoryState> {
  let marker_name = version.marker_name();

  let state = RepositoryState {
    dirty_paths: git.dirty_paths()?,
    branch: git.current_branch()?,
    marker_exists: git.tag_exists(&marker_name)?,
    marker_name,
    current_version: descriptors.first().and_then(|d| current_version(git, d)),
  };

  debug!(
    dirty = state.dirty_paths.len(),
    branch = ?state.branch,
    marker_exists = state.marker_exists,
    "inspected repository"
  );

  Ok(state)
}

/// Version currently recorded in a descriptor; unreadable files yield `None`
/// and are reported properly by the mutator
fn current_version(git: &SystemGit, descriptor: &DescriptorConfig) -> Option<String> {
  let path = git.work_tree().join(&descriptor.path);
  let content = std::fs::read_to_string(&path).ok()?;
  adapter_for(descriptor.format)
    .read_version(&descriptor.path, &content, descriptor.field())
    .ok()
}

/// A release precondition that does not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PreconditionFailure {
  /// Uncommitted or untracked paths (overridable)
  DirtyWorkingTree { paths: Vec<String> },

  /// HEAD is not on a canonical branch (overridable)
  NonCanonicalBranch {
    current: Option<String>,
    expected: Vec<String>,
  },

  /// Marker for this version already exists (fatal)
  MarkerExists { name: String },
}

impl PreconditionFailure {
  /// Fatal failures abort the release regardless of any flag
  pub fn is_fatal(&self) -> bool {
    matches!(self, PreconditionFailure::MarkerExists { .. })
  }
}

impl fmt::Display for PreconditionFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionFailure::DirtyWorkingTree { paths } => {
        let listed: Vec<&str> = paths.iter().take(MAX_LISTED_PATHS).map(String::as_str).collect();
        write!(f, "Working tree has {} uncommitted path(s): {}", paths.len(), listed.join(", "))?;
        if paths.len() > MAX_LISTED_PATHS {
          write!(f, " (and {} more)", paths.len() - MAX_LISTED_PATHS)?;
        }
        Ok(())
      }
      PreconditionFailure::NonCanonicalBranch { current, expected } => match current {
        Some(branch) => write!(
          f,
          "On branch '{}', releases are cut from {}",
          branch,
          expected.join(" or ")
        ),
        None => write!(f, "HEAD is detached, releases are cut from {}", expected.join(" or ")),
      },
      PreconditionFailure::MarkerExists { name } => write!(f, "Release marker {} already exists", name),
    }
  }
}

/// Evaluated preconditions for one release attempt
#[derive(Debug, Clone, Serialize)]
pub struct Preflight {
  pub results: Vec<CheckResult>,
}

impl Preflight {
  /// Failures no flag can override
  pub fn fatal(&self) -> Vec<&PreconditionFailure> {
    self.failures(Severity::Error)
  }

  /// Failures that --force or an explicit confirmation can override
  pub fn overridable(&self) -> Vec<&PreconditionFailure> {
    self.failures(Severity::Warning)
  }

  /// Non-blocking notes
  pub fn notes(&self) -> Vec<&str> {
    self
      .results
      .iter()
      .filter(|r| !r.passed && r.severity == Severity::Info)
      .map(|r| r.message.as_str())
      .collect()
  }

  /// Failed results, in check order
  pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
    self.results.iter().filter(|r| !r.passed && r.failure.is_some())
  }

  /// No fatal and no overridable failures
  pub fn is_clear(&self) -> bool {
    self.failed().next().is_none()
  }

  fn failures(&self, severity: Severity) -> Vec<&PreconditionFailure> {
    self
      .results
      .iter()
      .filter(|r| !r.passed && r.severity == severity)
      .filter_map(|r| r.failure.as_ref())
      .collect()
  }
}

/// Evaluate every release precondition against a state snapshot
pub fn assert_preconditions(
  state: &RepositoryState,
  version: &Version,
  canonical_branches: &[String],
  prerelease: bool,
) -> Preflight {
  let ctx = CheckContext {
    state,
    version,
    canonical_branches,
    prerelease,
  };

  Preflight {
    results: create_release_runner().run_all(&ctx),
  }
}
