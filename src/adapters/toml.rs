//! TOML manifest adapter (Cargo.toml, pyproject.toml, ...)
//!
//! Uses `toml_edit` so comments, ordering and formatting survive the edit. The
//! version is looked up in `[package]`, then `[project]`, then at the top level.

use super::{DescriptorAdapter, DescriptorFormat, FieldUpdate, Rewrite};
use crate::core::error::MutationFailure;
use crate::release::version::Version;
use anyhow::Result;
use std::path::Path;
use toml_edit::DocumentMut;

/// Tables searched for the version key, in order
const VERSION_TABLES: [&str; 2] = ["package", "project"];

pub struct TomlDescriptor;

impl DescriptorAdapter for TomlDescriptor {
  fn format(&self) -> DescriptorFormat {
    DescriptorFormat::Toml
  }

  fn read_version(&self, path: &Path, content: &str, field: &str) -> Result<String> {
    let doc = parse(path, content)?;
    let table = version_table(&doc, field);

    let item = match table {
      Some(name) => doc.get(name).and_then(|t| t.as_table_like()).and_then(|t| t.get(field)),
      None => doc.get(field),
    };

    match item {
      Some(item) => item
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| not_a_string(path, field).into()),
      None => Err(
        MutationFailure::MissingField {
          path: path.to_path_buf(),
          field: field.to_string(),
        }
        .into(),
      ),
    }
  }

  fn rewrite(&self, path: &Path, content: &str, field: &str, version: &Version) -> Result<Rewrite> {
    let mut doc = parse(path, content)?;
    let table = version_table(&doc, field);

    let item = match table {
      Some(name) => doc
        .get_mut(name)
        .and_then(|t| t.as_table_like_mut())
        .and_then(|t| t.get_mut(field)),
      None => doc.get_mut(field),
    };

    let Some(item) = item else {
      return Err(
        MutationFailure::MissingField {
          path: path.to_path_buf(),
          field: field.to_string(),
        }
        .into(),
      );
    };

    let Some(value) = item.as_value_mut() else {
      return Err(not_a_string(path, field).into());
    };
    let Some(current) = value.as_str().map(str::to_string) else {
      // e.g. `version.workspace = true`
      return Err(not_a_string(path, field).into());
    };

    // Keep the surrounding whitespace and trailing comment
    let decor = value.decor().clone();
    *value = toml_edit::Value::from(version.as_str());
    *value.decor_mut() = decor;

    Ok(Rewrite {
      content: doc.to_string(),
      updates: vec![FieldUpdate {
        field: table.map(|t| format!("{}.{}", t, field)).unwrap_or_else(|| field.to_string()),
        from: current,
        to: version.to_string(),
      }],
    })
  }
}

fn parse(path: &Path, content: &str) -> Result<DocumentMut> {
  let doc = content.parse::<DocumentMut>().map_err(|e| MutationFailure::Unparseable {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;
  Ok(doc)
}

/// First table holding `field`, or `None` for a top-level key
fn version_table(doc: &DocumentMut, field: &str) -> Option<&'static str> {
  VERSION_TABLES.into_iter().find(|name| {
    doc
      .get(name)
      .and_then(|t| t.as_table_like())
      .is_some_and(|t| t.contains_key(field))
  })
}

fn not_a_string(path: &Path, field: &str) -> MutationFailure {
  MutationFailure::Unparseable {
    path: path.to_path_buf(),
    reason: format!("'{}' is not a plain version string (inherited or computed values cannot be bumped)", field),
  }
}
