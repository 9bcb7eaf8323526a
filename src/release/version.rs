//! Release version model
//!
//! A release version is exactly `MAJOR.MINOR.PATCH[-label]`. Parsing leans on the
//! `semver` crate for the grammar (numeric components, no leading zeros, label
//! identifiers) and rejects the two things semver allows but a release input must
//! not carry: a leading `v` and `+build` metadata.
//!
//! Two names derive from a version:
//! - the marker name `v{raw}`, which keeps the label
//! - the numeric encoding `major * 10000 + minor * 100 + patch`, which drops it

use crate::core::error::VersionError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated release version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  raw: String,
  inner: semver::Version,
}

impl Version {
  /// Parse and validate user input
  pub fn parse(input: &str) -> Result<Self, VersionError> {
    if input.is_empty() {
      return Err(VersionError::Empty);
    }

    if input.starts_with('v') || input.starts_with('V') {
      return Err(VersionError::LeadingV {
        input: input.to_string(),
      });
    }

    if input.contains('+') {
      return Err(VersionError::BuildMetadata {
        input: input.to_string(),
      });
    }

    let inner = semver::Version::parse(input).map_err(|e| VersionError::Malformed {
      input: input.to_string(),
      reason: describe_malformed(input, &e),
    })?;

    // git refuses ref names ending in ".lock"; the label is the only place one can appear
    if inner.pre.as_str().ends_with(".lock") {
      return Err(VersionError::Malformed {
        input: input.to_string(),
        reason: "a pre-release label may not end in '.lock' (not a valid git tag name)".to_string(),
      });
    }

    // Encoding must stay total over every accepted version
    encode_triple(inner.major, inner.minor, inner.patch).ok_or_else(|| VersionError::Malformed {
      input: input.to_string(),
      reason: "components too large for the numeric build encoding".to_string(),
    })?;

    Ok(Self {
      raw: input.to_string(),
      inner,
    })
  }

  /// The exact string the operator typed
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn major(&self) -> u64 {
    self.inner.major
  }

  pub fn minor(&self) -> u64 {
    self.inner.minor
  }

  pub fn patch(&self) -> u64 {
    self.inner.patch
  }

  /// Pre-release label, if any (`beta`, `alpha.1`)
  pub fn label(&self) -> Option<&str> {
    if self.inner.pre.is_empty() {
      None
    } else {
      Some(self.inner.pre.as_str())
    }
  }

  /// Whether the version carries a pre-release label
  pub fn is_prerelease(&self) -> bool {
    self.label().is_some()
  }

  /// Numeric build encoding used by the platform descriptor
  ///
  /// The label is ignored: `1.0.0` and `1.0.0-beta` share an encoding.
  pub fn encode(&self) -> u64 {
    // Bounds were checked in parse()
    encode_triple(self.major(), self.minor(), self.patch()).unwrap_or(u64::MAX)
  }

  /// Release marker (tag) name
  pub fn marker_name(&self) -> String {
    format!("v{}", self.raw)
  }
}

fn encode_triple(major: u64, minor: u64, patch: u64) -> Option<u64> {
  major
    .checked_mul(10_000)?
    .checked_add(minor.checked_mul(100)?)?
    .checked_add(patch)
}

/// Explain why the core part does not fit the grammar
fn describe_malformed(input: &str, err: &semver::Error) -> String {
  let core = input.split('-').next().unwrap_or(input);
  let components = core.split('.').count();

  match components {
    1 => "missing minor and patch components".to_string(),
    2 => "missing patch component".to_string(),
    3 => err.to_string(),
    n => format!("expected 3 numeric components, found {}", n),
  }
}

impl FromStr for Version {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

impl Serialize for Version {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.raw)
  }
}
