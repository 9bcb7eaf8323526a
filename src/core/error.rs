//! Error types for vership with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Errors that leave the repository in a state
//! the operator must look at (failed verification, partial publish) always carry
//! a help line saying what is left behind.

use crate::release::verify::VerifyStage;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for vership
///
/// Failure categories are carried in the report, never in the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Release completed or dry-run report produced
  Success = 0,
  /// Any validation, precondition, verification or publish failure, or a declined prompt
  Failure = 1,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for vership
#[derive(Debug)]
pub enum ShipError {
  /// Malformed version input
  Version(VersionError),

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Descriptor file could not be updated
  Mutation(MutationFailure),

  /// Test suite or build check failed
  Verification(VerificationFailure),

  /// Commit, tag or push failed
  Publish(PublishFailure),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ShipError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  ///
  /// Typed errors keep their variant (and help text) and ignore the context.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ShipError::Message { message, context, help } => ShipError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ShipError::Io(e) => ShipError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", e)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    ExitCode::Failure
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ShipError::Version(e) => e.help_message(),
      ShipError::Config(e) => e.help_message(),
      ShipError::Git(e) => e.help_message(),
      ShipError::Mutation(e) => e.help_message(),
      ShipError::Verification(e) => e.help_message(),
      ShipError::Publish(e) => e.help_message(),
      ShipError::Message { help, .. } => help.clone(),
      ShipError::Io(_) => None,
    }
  }
}

impl fmt::Display for ShipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShipError::Version(e) => write!(f, "{}", e),
      ShipError::Config(e) => write!(f, "{}", e),
      ShipError::Git(e) => write!(f, "{}", e),
      ShipError::Mutation(e) => write!(f, "{}", e),
      ShipError::Verification(e) => write!(f, "{}", e),
      ShipError::Publish(e) => write!(f, "{}", e),
      ShipError::Io(e) => write!(f, "I/O error: {}", e),
      ShipError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ShipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ShipError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ShipError {
  fn from(err: io::Error) -> Self {
    ShipError::Io(err)
  }
}

impl From<VersionError> for ShipError {
  fn from(err: VersionError) -> Self {
    ShipError::Version(err)
  }
}

impl From<ConfigError> for ShipError {
  fn from(err: ConfigError) -> Self {
    ShipError::Config(err)
  }
}

impl From<GitError> for ShipError {
  fn from(err: GitError) -> Self {
    ShipError::Git(err)
  }
}

impl From<MutationFailure> for ShipError {
  fn from(err: MutationFailure) -> Self {
    ShipError::Mutation(err)
  }
}

impl From<VerificationFailure> for ShipError {
  fn from(err: VerificationFailure) -> Self {
    ShipError::Verification(err)
  }
}

impl From<PublishFailure> for ShipError {
  fn from(err: PublishFailure) -> Self {
    ShipError::Publish(err)
  }
}

impl From<serde_json::Error> for ShipError {
  fn from(err: serde_json::Error) -> Self {
    ShipError::message(format!("JSON error: {}", err))
  }
}

/// Convert anyhow::Error (descriptor adapters) to ShipError
impl From<anyhow::Error> for ShipError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<MutationFailure>() {
      Ok(failure) => ShipError::Mutation(failure),
      Err(err) => ShipError::message(format!("{:#}", err)),
    }
  }
}

/// Version input errors
///
/// Every message names the accepted grammar, never just "invalid".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
  /// Nothing was given
  Empty,

  /// Input starts with `v`/`V`
  LeadingV { input: String },

  /// Input carries `+build` metadata
  BuildMetadata { input: String },

  /// Anything else that is not MAJOR.MINOR.PATCH[-label]
  Malformed { input: String, reason: String },
}

/// Grammar shown in every version error
pub const VERSION_GRAMMAR: &str = "MAJOR.MINOR.PATCH[-label] (e.g. 2.1.0 or 1.2.3-beta.1)";

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::LeadingV { input } => Some(format!(
        "Drop the leading 'v' and pass '{}'; the release marker adds the prefix itself.",
        &input[1..]
      )),
      VersionError::BuildMetadata { input } => {
        let core = input.split('+').next().unwrap_or(input);
        Some(format!("Build metadata is not part of a release version. Try '{}'.", core))
      }
      _ => None,
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::Empty => write!(f, "No version given. Expected {}", VERSION_GRAMMAR),
      VersionError::LeadingV { input } => {
        write!(f, "Invalid version '{}': leading 'v' not allowed. Expected {}", input, VERSION_GRAMMAR)
      }
      VersionError::BuildMetadata { input } => {
        write!(f, "Invalid version '{}': build metadata not allowed. Expected {}", input, VERSION_GRAMMAR)
      }
      VersionError::Malformed { input, reason } => {
        write!(f, "Invalid version '{}': {}. Expected {}", input, reason, VERSION_GRAMMAR)
      }
    }
  }
}

impl std::error::Error for VersionError {}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file could not be parsed
  Parse { path: PathBuf, reason: String },

  /// Config parsed but holds an unusable value
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Parse { path, .. } => Some(format!(
        "Fix the TOML syntax in {} or remove the file to use the defaults.",
        path.display()
      )),
      ConfigError::Invalid { field, .. } => Some(format!("Check the '{}' entry in release.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Parse { path, reason } => {
        write!(f, "Failed to parse config {}: {}", path.display(), reason)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid config value for '{}': {}", field, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run vership from inside a git repository or pass --repo (checked: {})",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } => {
        if stderr.contains("Please tell me who you are") {
          Some("Configure a git identity: git config user.name / git config user.email".to_string())
        } else {
          None
        }
      }
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Descriptor update failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
  /// Descriptor file does not exist
  MissingFile { path: PathBuf },

  /// Descriptor exists but the tracked field is absent
  MissingField { path: PathBuf, field: String },

  /// Descriptor could not be parsed in its declared format
  Unparseable { path: PathBuf, reason: String },
}

impl MutationFailure {
  fn help_message(&self) -> Option<String> {
    match self {
      MutationFailure::MissingFile { .. } => {
        Some("Adjust the [[descriptors]] list in release.toml to match the repository layout.".to_string())
      }
      MutationFailure::MissingField { field, .. } => Some(format!(
        "Add a '{}' field to the descriptor, or set `field` for it in release.toml.",
        field
      )),
      MutationFailure::Unparseable { .. } => None,
    }
  }
}

impl fmt::Display for MutationFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MutationFailure::MissingFile { path } => write!(f, "Descriptor not found: {}", path.display()),
      MutationFailure::MissingField { path, field } => {
        write!(f, "Descriptor {} has no '{}' field", path.display(), field)
      }
      MutationFailure::Unparseable { path, reason } => {
        write!(f, "Failed to parse descriptor {}: {}", path.display(), reason)
      }
    }
  }
}

impl std::error::Error for MutationFailure {}

/// Verification gate failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
  /// Command ran and exited non-zero (or was killed)
  StageFailed {
    stage: VerifyStage,
    command: String,
    code: Option<i32>,
  },

  /// Command could not be started
  Spawn {
    stage: VerifyStage,
    command: String,
    reason: String,
  },
}

impl VerificationFailure {
  /// The sub-stage that failed
  pub fn stage(&self) -> VerifyStage {
    match self {
      VerificationFailure::StageFailed { stage, .. } | VerificationFailure::Spawn { stage, .. } => *stage,
    }
  }

  fn help_message(&self) -> Option<String> {
    let flag = match self.stage() {
      VerifyStage::Tests => "--skip-tests",
      VerifyStage::BuildCheck => "--skip-build",
    };
    Some(format!(
      "Descriptor edits were left in place (uncommitted). Fix the problem and re-run, \
       or inspect with `git diff`. {} bypasses this stage and is recorded in the release marker.",
      flag
    ))
  }
}

impl fmt::Display for VerificationFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VerificationFailure::StageFailed { stage, command, code } => match code {
        Some(code) => write!(f, "Verification stage '{}' failed: `{}` exited with code {}", stage, command, code),
        None => write!(f, "Verification stage '{}' failed: `{}` was terminated by a signal", stage, command),
      },
      VerificationFailure::Spawn { stage, command, reason } => {
        write!(f, "Verification stage '{}' could not start `{}`: {}", stage, command, reason)
      }
    }
  }
}

/// Publisher failures, one per publish step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishFailure {
  /// Staging or committing the descriptors failed
  Commit { reason: String },

  /// The marker appeared between preflight and tag creation
  MarkerExists { name: String },

  /// Tag creation failed for another reason
  Tag { name: String, reason: String },

  /// Branch push failed; release commit and marker exist locally
  PushBranch {
    remote: String,
    branch: String,
    marker: String,
    reason: String,
  },

  /// Marker push failed; branch may already be on the remote
  PushMarker {
    remote: String,
    marker: String,
    reason: String,
  },
}

impl PublishFailure {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishFailure::Commit { .. } => {
        Some("Descriptor edits are still in the working tree. Resolve the git problem and re-run.".to_string())
      }
      PublishFailure::MarkerExists { name } => Some(format!(
        "Another process created {} after preflight. Inspect it with `git show {}`; vership never overwrites a marker.",
        name, name
      )),
      PublishFailure::Tag { .. } => Some(
        "The release commit exists locally without a marker. Inspect with `git log -1` before retrying.".to_string(),
      ),
      PublishFailure::PushBranch { remote, marker, .. } | PublishFailure::PushMarker { remote, marker, .. } => {
        Some(format!(
          "The release commit and marker {marker} exist locally but may not be on '{remote}'. \
           Verify remote state manually (`git ls-remote --tags {remote} {marker}`) and push what is missing \
           (`git push {remote} refs/tags/{marker}`). Do not blindly re-run: the local marker now exists and \
           the duplicate-marker check will refuse the release."
        ))
      }
    }
  }
}

impl fmt::Display for PublishFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishFailure::Commit { reason } => write!(f, "Failed to commit release descriptors: {}", reason.trim_end()),
      PublishFailure::MarkerExists { name } => write!(f, "Release marker {} already exists", name),
      PublishFailure::Tag { name, reason } => write!(f, "Failed to create marker {}: {}", name, reason.trim_end()),
      PublishFailure::PushBranch {
        remote, branch, reason, ..
      } => write!(f, "Push of branch {} to {} failed: {}", branch, remote, reason.trim_end()),
      PublishFailure::PushMarker { remote, marker, reason } => {
        write!(f, "Push of marker {} to {} failed: {}", marker, remote, reason.trim_end())
      }
    }
  }
}

/// Result type alias for vership
pub type ShipResult<T> = Result<T, ShipError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ShipResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ShipError>,
{
  fn context(self, ctx: impl Into<String>) -> ShipResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ShipError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
