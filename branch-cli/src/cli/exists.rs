//! `exists`: does a branch have a current timespan?

use anyhow::{Context, Result};
use branch_core::path::BranchPath;
use clap::Args;

use crate::cli::open_coordinator;
use crate::config::StoreConfig;
use crate::output::print_info;

#[derive(Args)]
pub struct ExistsArgs {
  pub path: String,
}

pub fn handle_exists(args: ExistsArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let coordinator = open_coordinator(config)?;
  let exists = coordinator.exists(&path)?;
  print_info(&format!("'{path}' exists: {exists}"));
  Ok(())
}
