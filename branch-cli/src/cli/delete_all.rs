//! `delete-all`: destructive full reset, for tests and administration.

use anyhow::Result;
use clap::Args;

use crate::cli::{open_coordinator, persist};
use crate::config::StoreConfig;
use crate::output::{print_success, print_warning};

#[derive(Args)]
pub struct DeleteAllArgs {
  /// Required acknowledgement that this destroys every branch record
  #[arg(long)]
  pub yes_i_am_sure: bool,
}

pub fn handle_delete_all(args: DeleteAllArgs, config: &StoreConfig) -> Result<()> {
  if !args.yes_i_am_sure {
    print_warning("refusing to delete everything without --yes-i-am-sure");
    return Ok(());
  }

  let coordinator = open_coordinator(config)?;
  coordinator.delete_all()?;
  persist(&coordinator, config)?;

  print_success("deleted all branch records");
  Ok(())
}
