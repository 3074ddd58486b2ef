//! # branch-cli Entry Point
//!
//! The main entry point for the branch-cli command-line tool, an operator
//! front end for the versioned branch service backed by a JSON-snapshot
//! in-memory store.

use anyhow::Result;
use clap::Parser;
use cli::{Cli, handle_cli};
use no_worries::{Config as NoWorriesConfig, Metadata as NoWorriesMetadata, no_worries};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;
mod config;
mod output;

fn main() -> Result<()> {
  let config: NoWorriesConfig = NoWorriesConfig {
    metadata: NoWorriesMetadata {
      name: "branch-cli".to_string(),
      support_email: Some("e@eddie.land".to_string()),
      ..Default::default()
    },
    ..Default::default()
  };
  no_worries!(config).expect("Failed to set up panic handler");

  let cmd = Cli::parse();

  let level = match cmd.verbose {
    0 => tracing::Level::WARN,
    1 => tracing::Level::INFO,
    2 => tracing::Level::DEBUG,
    _ => tracing::Level::TRACE,
  };

  tracing_subscriber::registry()
    .with(fmt::layer())
    .with(EnvFilter::from_default_env().add_directive(level.into()))
    .init();

  debug!("Tracing initialized with level: {}", level);

  handle_cli(cmd)
}
