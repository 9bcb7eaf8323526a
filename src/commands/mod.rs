//! CLI commands for vership
//!
//! - **release**: run the release pipeline and report its outcome

pub mod release;

pub use release::run_release;
