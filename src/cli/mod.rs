//! cli
//!
//! Command-line interface layer for treeline.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Delegate to command handlers
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::engine`], which owns every remote interaction.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::prompts;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = Config::load().context("Failed to load config")?;
    init_tracing(cli.debug, config.log_level());

    let ctx = commands::Context {
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
        interactive: !cli.quiet && prompts::is_interactive(),
    };

    commands::dispatch(cli.command, &ctx, config)
}

/// Install the global subscriber, writing to stderr.
///
/// `--debug` forces debug output; otherwise `RUST_LOG` wins over the
/// configured level.
fn init_tracing(debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("treeline=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("treeline={level}")))
    };

    // A second install (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
