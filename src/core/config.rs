use crate::adapters::DescriptorFormat;
use crate::core::error::{ConfigError, ResultExt, ShipResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for vership
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every field is optional; a repository without a config file gets the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  /// Remote that receives the branch and the marker
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Branches a release is expected to be cut from
  #[serde(default = "default_canonical_branches")]
  pub canonical_branches: Vec<String>,

  /// Commit message template; `{version}` is replaced with the raw version
  #[serde(default = "default_commit_message")]
  pub commit_message: String,

  /// Artifact names the downstream build is expected to produce (templates)
  #[serde(default = "default_artifacts")]
  pub artifacts: Vec<String>,

  /// Tracked descriptor files
  #[serde(default = "default_descriptors")]
  pub descriptors: Vec<DescriptorConfig>,

  /// Sign the marker with the user's GPG key (`git tag -s`) instead of a plain annotated tag
  #[serde(default)]
  pub sign_marker: bool,

  /// Verification commands
  #[serde(default)]
  pub verify: VerifyConfig,
}

/// One tracked descriptor file
///
/// # Example
///
/// ```toml
/// [[descriptors]]
/// path = "package.json"
/// format = "json"
///
/// [[descriptors]]
/// path = "android/app/build.gradle"
/// format = "gradle"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorConfig {
  /// Path relative to the repository root
  pub path: PathBuf,

  /// How the version is stored in the file
  pub format: DescriptorFormat,

  /// Version key for json/toml descriptors (default: "version")
  #[serde(default)]
  pub field: Option<String>,
}

impl DescriptorConfig {
  /// Version key, falling back to "version"
  pub fn field(&self) -> &str {
    self.field.as_deref().unwrap_or("version")
  }
}

/// Verification gate commands (argv arrays, run from the repository root)
///
/// An empty array disables the stage; it is then reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyConfig {
  #[serde(default = "default_test_command")]
  pub tests: Vec<String>,

  #[serde(default = "default_build_check_command")]
  pub build_check: Vec<String>,
}

impl Default for VerifyConfig {
  fn default() -> Self {
    Self {
      tests: default_test_command(),
      build_check: default_build_check_command(),
    }
  }
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_canonical_branches() -> Vec<String> {
  vec!["main".to_string(), "master".to_string()]
}

fn default_commit_message() -> String {
  "chore(release): v{version}".to_string()
}

fn default_artifacts() -> Vec<String> {
  vec![
    "app-release-{version}.apk".to_string(),
    "app-release-{version}.aab".to_string(),
  ]
}

fn default_descriptors() -> Vec<DescriptorConfig> {
  vec![
    DescriptorConfig {
      path: PathBuf::from("package.json"),
      format: DescriptorFormat::Json,
      field: None,
    },
    DescriptorConfig {
      path: PathBuf::from("android/app/build.gradle"),
      format: DescriptorFormat::Gradle,
      field: None,
    },
  ]
}

fn default_test_command() -> Vec<String> {
  vec!["npm".to_string(), "test".to_string()]
}

fn default_build_check_command() -> Vec<String> {
  vec!["npm".to_string(), "run".to_string(), "build".to_string()]
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      remote: default_remote(),
      canonical_branches: default_canonical_branches(),
      commit_message: default_commit_message(),
      artifacts: default_artifacts(),
      descriptors: default_descriptors(),
      sign_marker: false,
      verify: VerifyConfig::default(),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the repository root, or defaults when no file exists
  pub fn load(path: &Path) -> ShipResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      debug!(root = %path.display(), "no release.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content).map_err(|e| ConfigError::Parse {
      path: config_path.clone(),
      reason: e.to_string(),
    })?;

    config.validate()?;
    debug!(path = %config_path.display(), descriptors = config.descriptors.len(), "loaded config");

    Ok(config)
  }

  /// Validate configuration
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.remote.trim().is_empty() {
      return Err(invalid("remote", "must not be empty"));
    }

    if self.canonical_branches.is_empty() {
      return Err(invalid("canonical_branches", "list at least one branch"));
    }

    if !self.commit_message.contains("{version}") {
      return Err(invalid("commit_message", "template must contain {version}"));
    }

    if let Some(artifact) = self.artifacts.iter().find(|a| !a.contains("{version}")) {
      return Err(invalid("artifacts", format!("'{}' does not contain {{version}}", artifact)));
    }

    if self.descriptors.is_empty() {
      return Err(invalid("descriptors", "track at least one descriptor file"));
    }

    let mut seen = HashSet::new();
    for descriptor in &self.descriptors {
      if descriptor.path.is_absolute() {
        return Err(invalid(
          "descriptors",
          format!("{} must be relative to the repository root", descriptor.path.display()),
        ));
      }
      if !seen.insert(&descriptor.path) {
        return Err(invalid(
          "descriptors",
          format!("{} is listed more than once", descriptor.path.display()),
        ));
      }
      if descriptor.format == DescriptorFormat::Gradle && descriptor.field.is_some() {
        return Err(invalid(
          "descriptors",
          format!("{}: gradle descriptors have fixed fields", descriptor.path.display()),
        ));
      }
    }

    Ok(())
  }

  /// Render the commit message for a version
  pub fn render_commit_message(&self, version: &str) -> String {
    self.commit_message.replace("{version}", version)
  }

  /// Render the expected artifact names for a version
  pub fn render_artifacts(&self, version: &str) -> Vec<String> {
    self.artifacts.iter().map(|a| a.replace("{version}", version)).collect()
  }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
  ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.into(),
  }
}
