//! Diagnostic logging
//!
//! User-facing progress goes to stdout with `println!`; `tracing` events are
//! diagnostics and always go to stderr, so `--json` output stays parseable.

use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is not set
fn default_directive(verbose: bool) -> &'static str {
  if verbose { "vership=debug" } else { "warn" }
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` wins over `--verbose` when both are given. Only the first call
/// takes effect.
pub fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init()
    .ok();
}
