//! Android Gradle build descriptor adapter
//!
//! Handles both the Groovy (`versionCode 10203`) and Kotlin DSL
//! (`versionCode = 10203`) spellings. `versionCode` receives the numeric
//! encoding and `versionName` the version string. Every uncommented occurrence
//! is rewritten, so product flavors that pin their own values follow the release.

use super::{DescriptorAdapter, DescriptorFormat, FieldUpdate, Rewrite};
use crate::core::error::MutationFailure;
use crate::release::version::Version;
use anyhow::Result;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static VERSION_CODE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^([ \t]*versionCode[ \t]*=?[ \t]*)(\d+)").expect("valid versionCode pattern"));

static VERSION_NAME: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?m)^([ \t]*versionName[ \t]*=?[ \t]*)(["'])([^"'\n]*)(["'])"#).expect("valid versionName pattern")
});

pub struct GradleDescriptor;

impl DescriptorAdapter for GradleDescriptor {
  fn format(&self) -> DescriptorFormat {
    DescriptorFormat::Gradle
  }

  fn read_version(&self, path: &Path, content: &str, _field: &str) -> Result<String> {
    let name = VERSION_NAME
      .captures(content)
      .map(|caps| caps[3].to_string())
      .ok_or_else(|| missing(path, "versionName"))?;
    Ok(name)
  }

  fn rewrite(&self, path: &Path, content: &str, field: &str, version: &Version) -> Result<Rewrite> {
    let code = version.encode().to_string();

    let current_code = VERSION_CODE
      .captures(content)
      .map(|caps| caps[2].to_string())
      .ok_or_else(|| missing(path, "versionCode"))?;
    let current_name = self.read_version(path, content, field)?;

    let with_code = VERSION_CODE.replace_all(content, |caps: &Captures| format!("{}{}", &caps[1], code));
    let with_name = VERSION_NAME.replace_all(&with_code, |caps: &Captures| {
      format!("{}{}{}{}", &caps[1], &caps[2], version.as_str(), &caps[4])
    });

    Ok(Rewrite {
      content: with_name.into_owned(),
      updates: vec![
        FieldUpdate {
          field: "versionCode".to_string(),
          from: current_code,
          to: code,
        },
        FieldUpdate {
          field: "versionName".to_string(),
          from: current_name,
          to: version.to_string(),
        },
      ],
    })
  }
}

fn missing(path: &Path, field: &str) -> MutationFailure {
  MutationFailure::MissingField {
    path: path.to_path_buf(),
    field: field.to_string(),
  }
}
