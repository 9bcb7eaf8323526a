//! Release pipeline state machine
//!
//! ```text
//! Validating → PreflightChecking ─┬→ DryRunReporting ───────────────────────────→ Done
//!                                 └→ Confirming → Mutating → Verifying → Publishing → Done
//! ```
//!
//! `Aborted` is reachable from every state except `Done`. `Confirming` is passed
//! through without a prompt when the run is forced. Fatal preconditions abort
//! before `Confirming`; nothing before `Mutating` writes to the repository.

use crate::checks::Severity;
use crate::core::config::ReleaseConfig;
use crate::core::error::{PublishFailure, ShipError, ShipResult};
use crate::core::plan::{Finding, Operation, ReleasePlan};
use crate::core::vcs::SystemGit;
use crate::release::inspect::{self, PreconditionFailure, Preflight, RepositoryState};
use crate::release::mutate;
use crate::release::publish::{self, PublishContext, ReleaseMarker};
use crate::release::verify::{self, SkipFlags, StageStatus, VerificationReport, VerifyStage};
use crate::release::version::Version;
use crate::utils::path_to_git_format;
use serde::Serialize;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Validating,
  PreflightChecking,
  DryRunReporting,
  Confirming,
  Mutating,
  Verifying,
  Publishing,
  Done,
  Aborted,
}

impl PipelineState {
  /// Whether `next` directly follows this state
  pub fn can_advance_to(self, next: PipelineState) -> bool {
    use PipelineState::*;

    match (self, next) {
      (Done, _) | (Aborted, _) => false,
      (_, Aborted) => true,
      (Validating, PreflightChecking)
      | (PreflightChecking, DryRunReporting)
      | (PreflightChecking, Confirming)
      | (DryRunReporting, Done)
      | (Confirming, Mutating)
      | (Mutating, Verifying)
      | (Verifying, Publishing)
      | (Publishing, Done) => true,
      _ => false,
    }
  }
}

/// Where a failed run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureStage {
  /// Version input, repository discovery or configuration
  Validation,
  /// Repository state could not be read
  Preflight,
  /// Descriptor files could not be updated
  Mutation,
  Tests,
  BuildCheck,
  Commit,
  Tag,
  PushBranch,
  PushMarker,
}

impl From<VerifyStage> for FailureStage {
  fn from(stage: VerifyStage) -> Self {
    match stage {
      VerifyStage::Tests => FailureStage::Tests,
      VerifyStage::BuildCheck => FailureStage::BuildCheck,
    }
  }
}

impl From<&PublishFailure> for FailureStage {
  fn from(failure: &PublishFailure) -> Self {
    match failure {
      PublishFailure::Commit { .. } => FailureStage::Commit,
      PublishFailure::MarkerExists { .. } | PublishFailure::Tag { .. } => FailureStage::Tag,
      PublishFailure::PushBranch { .. } => FailureStage::PushBranch,
      PublishFailure::PushMarker { .. } => FailureStage::PushMarker,
    }
  }
}

impl fmt::Display for FailureStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FailureStage::Validation => "validation",
      FailureStage::Preflight => "preflight",
      FailureStage::Mutation => "mutation",
      FailureStage::Tests => "tests",
      FailureStage::BuildCheck => "build-check",
      FailureStage::Commit => "commit",
      FailureStage::Tag => "tag",
      FailureStage::PushBranch => "push-branch",
      FailureStage::PushMarker => "push-marker",
    };
    write!(f, "{}", name)
  }
}

/// A completed release
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSummary {
  pub version: String,
  pub version_code: u64,
  pub prerelease: bool,
  pub marker: ReleaseMarker,
  /// Descriptors written by this run
  pub changed: Vec<String>,
  pub verification: VerificationReport,
  /// Artifact names the downstream build is expected to produce
  pub artifacts: Vec<String>,
  /// Overridable preconditions that were bypassed (forced or confirmed)
  pub overridden: Vec<PreconditionFailure>,
  pub notes: Vec<String>,
}

/// How a run ended
#[derive(Debug)]
pub enum ReleaseOutcome {
  Completed(Box<ReleaseSummary>),
  AbortedByUser,
  AbortedByPrecondition(Vec<PreconditionFailure>),
  FailedAtStage { stage: FailureStage, cause: ShipError },
  DryRunReport(Box<ReleasePlan>),
}

impl ReleaseOutcome {
  /// Only a completed release or a dry-run report counts as success
  pub fn is_success(&self) -> bool {
    matches!(self, ReleaseOutcome::Completed(_) | ReleaseOutcome::DryRunReport(_))
  }
}

/// Options for one run, built once at the CLI boundary
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
  /// Directory inside the repository to release
  pub root: PathBuf,
  /// Version exactly as given on the command line
  pub version: String,
  pub skip_tests: bool,
  pub skip_build: bool,
  pub prerelease: bool,
  pub dry_run: bool,
  /// Skip the confirmation prompt and override non-fatal preconditions
  pub force: bool,
  /// Suppress progress output (JSON mode)
  pub quiet: bool,
}

impl ReleaseOptions {
  fn skip_flags(&self) -> SkipFlags {
    SkipFlags {
      tests: self.skip_tests,
      build: self.skip_build,
    }
  }
}

/// Operator confirmation
pub trait Confirm {
  /// Ask a yes/no question; anything but an explicit yes is a no
  fn confirm(&mut self, prompt: &str) -> bool;
}

/// Interactive `[y/N]` prompt on the terminal; end of input declines
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
  fn confirm(&mut self, prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = io::stderr().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
      Ok(0) => {
        eprintln!();
        debug!("confirmation hit end of input, treating as no");
        false
      }
      Ok(_) => is_yes(&line),
      Err(e) => {
        debug!(error = %e, "failed to read confirmation");
        false
      }
    }
  }
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

struct Pipeline<'a> {
  state: PipelineState,
  opts: &'a ReleaseOptions,
}

impl Pipeline<'_> {
  fn advance(&mut self, next: PipelineState) {
    debug_assert!(
      self.state.can_advance_to(next),
      "invalid transition {:?} → {:?}",
      self.state,
      next
    );
    info!(from = ?self.state, to = ?next, "pipeline transition");
    self.state = next;
  }

  fn say(&self, line: impl AsRef<str>) {
    if !self.opts.quiet {
      println!("{}", line.as_ref());
    }
  }

  fn fail(&mut self, stage: FailureStage, cause: impl Into<ShipError>) -> ReleaseOutcome {
    self.advance(PipelineState::Aborted);
    ReleaseOutcome::FailedAtStage {
      stage,
      cause: cause.into(),
    }
  }
}

/// Run the release pipeline
pub fn run(opts: &ReleaseOptions, confirm: &mut dyn Confirm) -> ReleaseOutcome {
  let mut pipeline = Pipeline {
    state: PipelineState::Validating,
    opts,
  };

  // Validating: nothing below may have side effects if this fails
  let version = match Version::parse(&opts.version) {
    Ok(v) => v,
    Err(e) => return pipeline.fail(FailureStage::Validation, e),
  };
  let (git, config) = match open(&opts.root) {
    Ok(found) => found,
    Err(e) => return pipeline.fail(FailureStage::Validation, e),
  };

  // PreflightChecking
  pipeline.advance(PipelineState::PreflightChecking);
  pipeline.say(format!("🔍 Checking repository for {}", version.marker_name()));
  let state = match inspect::inspect(&git, &version, &config.descriptors) {
    Ok(state) => state,
    Err(e) => return pipeline.fail(FailureStage::Preflight, e),
  };
  let preflight = inspect::assert_preconditions(&state, &version, &config.canonical_branches, opts.prerelease);

  if opts.dry_run {
    pipeline.advance(PipelineState::DryRunReporting);
    let plan = build_plan(&git, &config, &version, &state, &preflight, opts);
    pipeline.advance(PipelineState::Done);
    return ReleaseOutcome::DryRunReport(Box::new(plan));
  }

  let fatal: Vec<PreconditionFailure> = preflight.fatal().into_iter().cloned().collect();
  if !fatal.is_empty() {
    pipeline.advance(PipelineState::Aborted);
    return ReleaseOutcome::AbortedByPrecondition(fatal);
  }

  // Confirming
  pipeline.advance(PipelineState::Confirming);
  let overridden: Vec<PreconditionFailure> = preflight.overridable().into_iter().cloned().collect();
  let notes: Vec<String> = preflight.notes().into_iter().map(str::to_string).collect();
  for note in &notes {
    pipeline.say(format!("ℹ️  {}", note));
  }

  if opts.force {
    for failure in &overridden {
      pipeline.say(format!("⚠️  Proceeding despite: {}", failure));
    }
  } else {
    for result in preflight.failed() {
      eprintln!("⚠️  {}", result.message);
      if let Some(suggestion) = &result.suggestion {
        eprintln!("   💡 {}", suggestion);
      }
    }

    let prompt = if preflight.is_clear() {
      format!("Release {} ({})?", version, version.marker_name())
    } else {
      format!("Release {} anyway?", version)
    };
    if !confirm.confirm(&prompt) {
      pipeline.advance(PipelineState::Aborted);
      return ReleaseOutcome::AbortedByUser;
    }
  }

  // Mutating
  pipeline.advance(PipelineState::Mutating);
  let root = git.work_tree().to_path_buf();
  let changed = match mutate::apply(&root, &config.descriptors, &version) {
    Ok(changed) => changed,
    Err(e) => return pipeline.fail(FailureStage::Mutation, e),
  };
  if changed.is_empty() {
    pipeline.say(format!("✏️  Descriptors already at {}", version));
  }
  for path in &changed {
    pipeline.say(format!("✏️  Updated {}", path.display()));
  }

  // Verifying
  pipeline.advance(PipelineState::Verifying);
  let verification = match verify::run(&root, &config.verify, opts.skip_flags(), opts.quiet) {
    Ok(report) => report,
    Err(e) => return pipeline.fail(e.stage().into(), e),
  };
  for stage in &verification.stages {
    if let StageStatus::Skipped(reason) = &stage.status {
      pipeline.say(format!("⏭️  Skipped {} ({})", stage.stage, reason));
    }
  }

  // Publishing
  pipeline.advance(PipelineState::Publishing);
  let ctx = PublishContext {
    remote: &config.remote,
    branch: state.branch.as_deref(),
    commit_message: config.render_commit_message(version.as_str()),
    sign: config.sign_marker,
    prerelease: opts.prerelease,
    verification: &verification,
    artifacts: config.render_artifacts(version.as_str()),
    quiet: opts.quiet,
  };
  let marker = match publish::publish(&git, &version, &changed, &ctx) {
    Ok(marker) => marker,
    Err(e) => return pipeline.fail(FailureStage::from(&e), e),
  };

  pipeline.advance(PipelineState::Done);
  ReleaseOutcome::Completed(Box::new(ReleaseSummary {
    version: version.to_string(),
    version_code: version.encode(),
    prerelease: opts.prerelease,
    marker,
    changed: changed.iter().map(|p| path_to_git_format(p)).collect(),
    verification,
    artifacts: config.render_artifacts(version.as_str()),
    overridden,
    notes,
  }))
}

/// Open the repository containing `root` and load its release config
fn open(root: &Path) -> ShipResult<(SystemGit, ReleaseConfig)> {
  let git = SystemGit::open(root)?;
  let config = ReleaseConfig::load(git.work_tree())?;
  Ok((git, config))
}

/// Describe what a live run would do, without doing any of it
fn build_plan(
  git: &SystemGit,
  config: &ReleaseConfig,
  version: &Version,
  state: &RepositoryState,
  preflight: &Preflight,
  opts: &ReleaseOptions,
) -> ReleasePlan {
  let mut plan = ReleasePlan::new(version.as_str(), version.encode(), version.marker_name());
  plan.current_version = state.current_version.clone();

  for result in preflight.results.iter().filter(|r| !r.passed) {
    plan.add_finding(Finding::from(result));
  }

  let mut files = Vec::new();
  match mutate::preview(git.work_tree(), &config.descriptors, version) {
    Ok(changes) => {
      for change in changes {
        let path = path_to_git_format(&change.path);
        for update in change.updates {
          plan.add_operation(Operation::UpdateDescriptor {
            path: path.clone(),
            format: change.format,
            field: update.field,
            from: update.from,
            to: update.to,
          });
        }
        if change.changed {
          files.push(path);
        }
      }
    }
    Err(e) => plan.add_finding(Finding {
      check: "descriptors".to_string(),
      severity: Severity::Error,
      message: e.to_string(),
    }),
  }

  for stage in verify::plan(&config.verify, opts.skip_flags()).stages {
    match stage.status {
      StageStatus::Skipped(reason) => plan.add_operation(Operation::SkipVerification {
        stage: stage.stage,
        reason,
      }),
      _ => plan.add_operation(Operation::RunVerification {
        stage: stage.stage,
        command: stage.command,
      }),
    }
  }

  let target = if files.is_empty() {
    "HEAD".to_string()
  } else {
    let target = "release commit".to_string();
    plan.add_operation(Operation::CreateCommit {
      message: config.render_commit_message(version.as_str()),
      files,
    });
    target
  };

  plan.add_operation(Operation::CreateMarker {
    name: version.marker_name(),
    target,
    signed: config.sign_marker,
  });

  if let Some(branch) = &state.branch {
    plan.add_operation(Operation::Push {
      remote: config.remote.clone(),
      refspec: format!("refs/heads/{}", branch),
    });
  }
  plan.add_operation(Operation::Push {
    remote: config.remote.clone(),
    refspec: format!("refs/tags/{}", version.marker_name()),
  });

  plan
}
