//! End-to-end tests that drive the `vership` binary against scratch repositories

mod helpers;
mod test_release;
