//! `unlock`: operator recovery for an abandoned commit.

use anyhow::{Context, Result};
use branch_core::path::BranchPath;
use clap::Args;

use crate::cli::{open_coordinator, persist};
use crate::config::StoreConfig;
use crate::output::{print_success, print_warning};

#[derive(Args)]
pub struct UnlockArgs {
  pub path: String,
}

pub fn handle_unlock(args: UnlockArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let coordinator = open_coordinator(config)?;
  coordinator
    .unlock(&path)
    .with_context(|| format!("failed to unlock '{path}'"))?;
  persist(&coordinator, config)?;

  print_warning("force-unlock is a recovery operation, not routine use");
  print_success(&format!("unlocked '{path}'"));
  Ok(())
}
