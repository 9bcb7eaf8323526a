mod adapters;
mod checks;
mod commands;
mod core;
mod release;
mod utils;

use clap::Parser;
use crate::core::error::{ShipError, print_error};
use crate::release::pipeline::ReleaseOptions;
use std::path::PathBuf;

/// Bump descriptor versions, verify, and publish a release marker
#[derive(Parser)]
#[command(name = "vership")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Version to release: MAJOR.MINOR.PATCH[-label], without a leading 'v'
  #[arg(value_name = "VERSION")]
  target_version: String,

  /// Skip the test suite (recorded in the release marker)
  #[arg(long)]
  skip_tests: bool,

  /// Skip the local build check (recorded in the release marker)
  #[arg(long)]
  skip_build: bool,

  /// Mark the release as a pre-release in the marker annotation
  #[arg(long)]
  prerelease: bool,

  /// Show what would happen without changing anything
  #[arg(long)]
  dry_run: bool,

  /// Do not ask for confirmation; override dirty-tree and branch warnings
  #[arg(short, long, visible_alias = "yes", visible_short_alias = 'y')]
  force: bool,

  /// Output the plan or outcome as JSON
  #[arg(long)]
  json: bool,

  /// Log every git and verification command (RUST_LOG overrides)
  #[arg(short, long)]
  verbose: bool,

  /// Repository to release (default: current directory)
  #[arg(short = 'C', long, value_name = "DIR")]
  repo: Option<PathBuf>,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  core::logging::init_logging(cli.verbose);

  let root = match cli.repo {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(ShipError::from(e).context("Failed to get current directory")),
    },
  };

  let opts = ReleaseOptions {
    root,
    version: cli.target_version,
    skip_tests: cli.skip_tests,
    skip_build: cli.skip_build,
    prerelease: cli.prerelease,
    dry_run: cli.dry_run,
    force: cli.force,
    quiet: cli.json,
  };

  let code = commands::run_release(opts, cli.json);
  std::process::exit(code.as_i32());
}

fn handle_error(err: ShipError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
