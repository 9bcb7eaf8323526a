//! Release plans for dry-run, review and audit
//!
//! A dry-run never touches the repository; it produces a `ReleasePlan` instead:
//! the ordered operations a live run would perform, plus the precondition
//! findings. Plans are JSON-serializable and identified by a content hash:
//!
//! - **Dry-run mode**: Show what will happen without actually doing it
//! - **Idempotency**: Same input → same operations → same plan id
//! - **Auditability**: `--json` emits the plan for logging/review
//!
//! The id covers the version and the operations. Findings describe the repository at the
//! time of the run and do not change what a release would do.

use crate::adapters::DescriptorFormat;
use crate::checks::{CheckResult, Severity};
use crate::release::verify::VerifyStage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan operations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Operation a live release would perform
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
  /// Rewrite one field of a descriptor
  UpdateDescriptor {
    path: String,
    format: DescriptorFormat,
    field: String,
    from: String,
    to: String,
  },

  /// Run a verification command
  RunVerification { stage: VerifyStage, command: Vec<String> },

  /// Verification stage that will not run
  SkipVerification { stage: VerifyStage, reason: String },

  /// Create the release commit
  CreateCommit { message: String, files: Vec<String> },

  /// Create the annotated release marker
  CreateMarker { name: String, target: String, signed: bool },

  /// Push to remote
  Push { remote: String, refspec: String },
}

/// A precondition finding recorded in the plan
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
  pub check: String,
  pub severity: Severity,
  pub message: String,
}

impl From<&CheckResult> for Finding {
  fn from(result: &CheckResult) -> Self {
    Self {
      check: result.check_name.clone(),
      severity: result.severity,
      message: result.message.clone(),
    }
  }
}

/// A release plan: what a live run of `vership <version>` would do
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  /// Plan ID (content hash of the operations)
  pub id: PlanId,

  pub version: String,

  /// Numeric version code written to platform descriptors
  pub version_code: u64,

  /// Version found in the first descriptor before the release
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current_version: Option<String>,

  pub marker: String,

  /// Operations to perform (in order)
  pub operations: Vec<Operation>,

  /// Failed preconditions and notes
  pub findings: Vec<Finding>,
}

impl ReleasePlan {
  /// Create an empty plan for a version
  pub fn new(version: impl Into<String>, version_code: u64, marker: impl Into<String>) -> Self {
    let mut plan = Self {
      id: PlanId::from_contents(&[]),
      version: version.into(),
      version_code,
      current_version: None,
      marker: marker.into(),
      operations: Vec::new(),
      findings: Vec::new(),
    };
    plan.recompute_id();
    plan
  }

  /// Add an operation to the plan
  pub fn add_operation(&mut self, operation: Operation) {
    self.operations.push(operation);
    self.recompute_id();
  }

  /// Record a precondition finding
  pub fn add_finding(&mut self, finding: Finding) {
    self.findings.push(finding);
  }

  /// Whether a live run would abort before any mutation
  pub fn is_blocked(&self) -> bool {
    self.findings.iter().any(|f| f.severity == Severity::Error)
  }

  /// Recompute plan ID based on current contents
  fn recompute_id(&mut self) {
    // The version is part of the hashed input so empty plans still differ
    let json = serde_json::to_vec(&(&self.version, &self.operations)).unwrap_or_default();
    self.id = PlanId::from_contents(&json);
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Release plan: {} ({})\n", self.marker, self.id));

    match &self.current_version {
      Some(current) => output.push_str(&format!(
        "   Version: {} → {} (version code {})\n",
        current, self.version, self.version_code
      )),
      None => output.push_str(&format!(
        "   Version: {} (version code {})\n",
        self.version, self.version_code
      )),
    }

    if !self.findings.is_empty() {
      output.push_str("\n   Preconditions:\n");
      for finding in &self.findings {
        let icon = match finding.severity {
          Severity::Error => "❌",
          Severity::Warning => "⚠️ ",
          Severity::Info => "ℹ️ ",
        };
        output.push_str(&format!("   {} {}\n", icon, finding.message));
      }
    }

    output.push_str(&format!("\n   Operations ({}):\n", self.operations.len()));

    for (i, op) in self.operations.iter().enumerate() {
      output.push_str(&format!("   {}. {}\n", i + 1, operation_to_string(op)));
    }

    if self.is_blocked() {
      output.push_str("\n❌ A live run would abort before changing anything (see preconditions above)\n");
    }

    output
  }
}

/// Convert operation to human-readable string
fn operation_to_string(op: &Operation) -> String {
  match op {
    Operation::UpdateDescriptor {
      path, field, from, to, ..
    } => {
      if from == to {
        format!("Keep {} {} at {} (already current)", path, field, to)
      } else {
        format!("Update {} {}: {} → {}", path, field, from, to)
      }
    }
    Operation::RunVerification { stage, command } => format!("Run {}: {} (would run)", stage, command.join(" ")),
    Operation::SkipVerification { stage, reason } => format!("Skip {} ({})", stage, reason),
    Operation::CreateCommit { message, files } => {
      format!("Create commit: {} ({} files)", message, files.len())
    }
    Operation::CreateMarker { name, target, signed } => {
      let kind = if *signed { "signed" } else { "annotated" };
      format!("Create {} marker {} on {}", kind, name, target)
    }
    Operation::Push { remote, refspec } => format!("Push {} to {}", refspec, remote),
  }
}
