//! Release precondition checks
//!
//! All checks implement the `Check` trait and run against one `RepositoryState`
//! snapshot, making it easy to add new preconditions without touching the
//! pipeline.
//!
//! # Built-in Checks
//!
//! - **marker-unique**: the release marker must not exist yet (fatal)
//! - **clean-tree**: no uncommitted or untracked paths (overridable)
//! - **canonical-branch**: HEAD is on a canonical branch (overridable)
//! - **prerelease-flag**: `--prerelease` agrees with the version label (note)

mod branch;
mod clean_tree;
mod marker;
mod prerelease;
mod runner;
mod trait_def;

// Re-export public API
pub use runner::create_release_runner;
pub use trait_def::{CheckContext, CheckResult, Severity};

// Individual checks are not exported - they're registered in create_release_runner()
