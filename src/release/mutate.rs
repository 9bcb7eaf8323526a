//! Descriptor mutation
//!
//! Edits the tracked descriptor files on disk. Nothing here stages or commits:
//! if a later stage fails, the edits stay in the working tree for inspection.

use crate::adapters::{DescriptorFormat, FieldUpdate, adapter_for};
use crate::core::config::DescriptorConfig;
use crate::core::error::{MutationFailure, ResultExt, ShipResult};
use crate::release::version::Version;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Planned edit of one descriptor
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorChange {
  /// Path relative to the repository root
  pub path: PathBuf,
  pub format: DescriptorFormat,
  /// Fields with their old and new values
  pub updates: Vec<FieldUpdate>,
  /// Whether the file content differs after the edit
  pub changed: bool,
  #[serde(skip)]
  content: String,
}

/// Compute the edits for every descriptor without writing anything
pub fn preview(root: &Path, descriptors: &[DescriptorConfig], version: &Version) -> ShipResult<Vec<DescriptorChange>> {
  descriptors.iter().map(|d| plan_change(root, d, version)).collect()
}

/// Apply `version` to every descriptor and return the paths that changed
///
/// All descriptors are read and rewritten in memory first, so a missing file or
/// field is reported before any file is written. Files whose content would not
/// change are left alone; applying the same version twice writes nothing the
/// second time.
pub fn apply(root: &Path, descriptors: &[DescriptorConfig], version: &Version) -> ShipResult<Vec<PathBuf>> {
  let changes = preview(root, descriptors, version)?;
  let mut written = Vec::new();

  for change in changes.into_iter().filter(|c| c.changed) {
    let full_path = root.join(&change.path);
    fs::write(&full_path, &change.content)
      .with_context(|| format!("Failed to write {}", full_path.display()))?;
    info!(path = %change.path.display(), version = %version, "descriptor updated");
    written.push(change.path);
  }

  Ok(written)
}

fn plan_change(root: &Path, descriptor: &DescriptorConfig, version: &Version) -> ShipResult<DescriptorChange> {
  let full_path = root.join(&descriptor.path);
  if !full_path.is_file() {
    return Err(
      MutationFailure::MissingFile {
        path: descriptor.path.clone(),
      }
      .into(),
    );
  }

  let original =
    fs::read_to_string(&full_path).with_context(|| format!("Failed to read {}", full_path.display()))?;
  let adapter = adapter_for(descriptor.format);
  let rewrite = adapter.rewrite(&descriptor.path, &original, descriptor.field(), version)?;

  let changed = rewrite.content != original;
  let current = rewrite.updates.iter().filter(|u| u.is_noop()).count();
  debug!(path = %descriptor.path.display(), changed, current, "descriptor previewed");

  Ok(DescriptorChange {
    path: descriptor.path.clone(),
    format: adapter.format(),
    updates: rewrite.updates,
    changed,
    content: rewrite.content,
  })
}
