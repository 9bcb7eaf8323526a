//! Utility functions for cross-platform path handling

use std::path::Path;

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn test_descriptor_paths_unix() {
    #[cfg(not(target_os = "windows"))]
    {
      let path = PathBuf::from("android/app/build.gradle");
      assert_eq!(path_to_git_format(&path), "android/app/build.gradle");

      let path = PathBuf::from("package.json");
      assert_eq!(path_to_git_format(&path), "package.json");
    }
  }

  #[test]
  fn test_descriptor_paths_windows() {
    #[cfg(target_os = "windows")]
    {
      let path = PathBuf::from("android\\app\\build.gradle");
      assert_eq!(path_to_git_format(&path), "android/app/build.gradle");
    }
  }
}
