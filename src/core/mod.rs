//! Core engine for vership
//!
//! - **config**: release.toml parsing and validation
//! - **error**: Error types with contextual help messages
//! - **logging**: tracing subscriber setup
//! - **plan**: Dry-run release plans with content-hash ids
//! - **vcs**: Git operations abstraction (SystemGit)

pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod vcs;
