//! Descriptor format adapters
//!
//! Each format knows how to find the version field(s) in one kind of descriptor
//! file and rewrite them in place, leaving every other byte of the file alone.
//!
//! Currently supports:
//! - JSON manifests (package.json, app.json): top-level version string
//! - TOML manifests (Cargo.toml, pyproject.toml): `[package]`/`[project]` version
//! - Gradle build descriptors (build.gradle, build.gradle.kts): versionCode + versionName

use crate::release::version::Version;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub mod gradle;
pub mod json;
pub mod toml;

/// How a descriptor stores its version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
  /// General manifest, single version string
  Json,
  /// General manifest, single version string
  Toml,
  /// Platform build descriptor, numeric build code plus version name
  Gradle,
}

impl fmt::Display for DescriptorFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DescriptorFormat::Json => write!(f, "json"),
      DescriptorFormat::Toml => write!(f, "toml"),
      DescriptorFormat::Gradle => write!(f, "gradle"),
    }
  }
}

/// One field changed by a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
  pub field: String,
  pub from: String,
  pub to: String,
}

impl FieldUpdate {
  pub fn is_noop(&self) -> bool {
    self.from == self.to
  }
}

/// Result of rewriting a descriptor's content
#[derive(Debug, Clone)]
pub struct Rewrite {
  /// Full file content after the edit
  pub content: String,
  /// Fields touched, with old and new values
  pub updates: Vec<FieldUpdate>,
}

/// Descriptor adapter trait
///
/// Adapters work on content, not on files: reading and writing stays with the
/// mutator so previews and real runs share one code path.
pub trait DescriptorAdapter: Send + Sync {
  /// The format this adapter handles
  fn format(&self) -> DescriptorFormat;

  /// Current version string stored in `content`
  fn read_version(&self, path: &Path, content: &str, field: &str) -> Result<String>;

  /// Rewrite `content` so its version field(s) carry `version`
  ///
  /// `path` is only used for error messages. `field` is the configured version
  /// key (ignored by formats with fixed fields).
  fn rewrite(&self, path: &Path, content: &str, field: &str, version: &Version) -> Result<Rewrite>;
}

/// Get the adapter for a descriptor format
pub fn adapter_for(format: DescriptorFormat) -> Box<dyn DescriptorAdapter> {
  match format {
    DescriptorFormat::Json => Box::new(json::JsonDescriptor),
    DescriptorFormat::Toml => Box::new(toml::TomlDescriptor),
    DescriptorFormat::Gradle => Box::new(gradle::GradleDescriptor),
  }
}
