//! `create` / `recursive-create`: materialize a branch at a path.

use anyhow::{Context, Result};
use branch_core::path::BranchPath;
use clap::Args;

use crate::cli::{open_coordinator, persist};
use crate::config::StoreConfig;
use crate::output::{print_info, print_success};

#[derive(Args)]
pub struct CreateArgs {
  /// Slash-delimited branch path, e.g. `MAIN/feature`
  pub path: String,

  /// Materialize missing ancestors along the way instead of failing
  #[arg(short, long)]
  pub recursive: bool,
}

pub fn handle_create(args: CreateArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let coordinator = open_coordinator(config)?;

  let record = if args.recursive {
    coordinator.recursive_create(&path)
  } else {
    coordinator.create(&path)
  }
  .with_context(|| format!("failed to create branch '{path}'"))?;

  persist(&coordinator, config)?;

  print_success(&format!("created branch '{path}'"));
  print_info(&format!("base={} head={}", record.base, record.head));
  Ok(())
}
