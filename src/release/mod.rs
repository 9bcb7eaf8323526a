//! Release orchestration
//!
//! A release is driven through these stages, leaf modules first:
//!
//! - **version**: parse `MAJOR.MINOR.PATCH[-label]`, derive the numeric build code
//! - **inspect**: snapshot the repository and evaluate preconditions
//! - **mutate**: write the new version into the tracked descriptors
//! - **verify**: run the test suite and build check
//! - **publish**: commit, create the annotated marker, push branch and marker
//! - **pipeline**: the state machine tying them together (dry-run, confirmation)
//!
//! The marker (`v{version}` tag) is the only signal the downstream build
//! watches for; everything before `publish` is local and recoverable.

pub mod inspect;
pub mod mutate;
pub mod pipeline;
pub mod publish;
pub mod verify;
pub mod version;
