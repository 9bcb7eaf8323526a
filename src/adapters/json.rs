//! JSON manifest adapter (package.json, app.json, ...)
//!
//! Serializing a `serde_json::Value` back out would reorder keys and reflow
//! whitespace, so the edit is a byte-range splice of the top-level value instead.
//! The result is parsed again to make sure the splice produced what we meant.

use super::{DescriptorAdapter, DescriptorFormat, FieldUpdate, Rewrite};
use crate::core::error::MutationFailure;
use crate::release::version::Version;
use anyhow::Result;
use serde_json::Value;
use std::ops::Range;
use std::path::Path;

pub struct JsonDescriptor;

impl DescriptorAdapter for JsonDescriptor {
  fn format(&self) -> DescriptorFormat {
    DescriptorFormat::Json
  }

  fn read_version(&self, path: &Path, content: &str, field: &str) -> Result<String> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| MutationFailure::Unparseable {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;

    // serde_json keeps the last duplicate while a splice would edit the first
    let occurrences = top_level_value_spans(content, field).len();
    if occurrences > 1 {
      return Err(
        MutationFailure::Unparseable {
          path: path.to_path_buf(),
          reason: format!("'{}' appears {} times at the top level", field, occurrences),
        }
        .into(),
      );
    }

    match parsed.get(field) {
      Some(Value::String(s)) => Ok(s.clone()),
      Some(_) => Err(
        MutationFailure::Unparseable {
          path: path.to_path_buf(),
          reason: format!("'{}' is not a string", field),
        }
        .into(),
      ),
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
    let current = self.read_version(path, content, field)?;

    let span = top_level_value_spans(content, field)
      .into_iter()
      .next()
      .flatten()
      .ok_or_else(|| MutationFailure::MissingField {
        path: path.to_path_buf(),
        field: field.to_string(),
      })?;

    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..span.start]);
    updated.push_str(version.as_str());
    updated.push_str(&content[span.end..]);

    let reparsed: Value = serde_json::from_str(&updated)?;
    if reparsed.get(field).and_then(Value::as_str) != Some(version.as_str()) {
      anyhow::bail!("Edit of '{}' in {} did not take effect", field, path.display());
    }

    Ok(Rewrite {
      content: updated,
      updates: vec![FieldUpdate {
        field: field.to_string(),
        from: current,
        to: version.to_string(),
      }],
    })
  }
}

/// One entry per top-level occurrence of `key`, holding the byte range of its
/// value between the quotes, or `None` when the value is not a string
fn top_level_value_spans(content: &str, key: &str) -> Vec<Option<Range<usize>>> {
  let bytes = content.as_bytes();
  let mut spans = Vec::new();
  let mut depth = 0usize;
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      b'{' | b'[' => {
        depth += 1;
        i += 1;
      }
      b'}' | b']' => {
        depth = depth.saturating_sub(1);
        i += 1;
      }
      b'"' => {
        let Some(end) = string_end(bytes, i) else {
          break;
        };
        let is_key = depth == 1 && &content[i + 1..end] == key;
        i = end + 1;

        if is_key {
          let colon = skip_whitespace(bytes, i);
          if bytes.get(colon) != Some(&b':') {
            continue;
          }
          let value = skip_whitespace(bytes, colon + 1);
          let span = match bytes.get(value) {
            Some(b'"') => string_end(bytes, value).map(|value_end| value + 1..value_end),
            _ => None,
          };
          if let Some(range) = &span {
            i = range.end + 1;
          }
          spans.push(span);
        }
      }
      _ => i += 1,
    }
  }

  spans
}

/// Index of the closing quote of the string starting at `start`
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
  let mut k = start + 1;
  while k < bytes.len() {
    match bytes[k] {
      b'\\' => k += 2,
      b'"' => return Some(k),
      _ => k += 1,
    }
  }
  None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
  while i < bytes.len() && bytes[i].is_ascii_whitespace() {
    i += 1;
  }
  i
}
