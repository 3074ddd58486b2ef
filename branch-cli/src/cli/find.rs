//! `find-latest` / `find-at` / `find-children`: read-only lookups.

use anyhow::{Context, Result};
use branch_core::path::BranchPath;
use branch_core::timepoint::Timepoint;
use chrono::DateTime;
use clap::Args;

use crate::cli::open_coordinator;
use crate::config::StoreConfig;
use crate::output::{print_info, print_warning};

#[derive(Args)]
pub struct FindLatestArgs {
  pub path: String,
}

pub fn handle_find_latest(args: FindLatestArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let coordinator = open_coordinator(config)?;
  match coordinator.find_latest(&path)? {
    Some(branch) => print_info(&format!(
      "'{path}' base={} head={} state={:?}",
      branch.record.base, branch.record.head, branch.state
    )),
    None => print_warning(&format!("no current timespan for '{path}'")),
  }
  Ok(())
}

#[derive(Args)]
pub struct FindAtArgs {
  pub path: String,

  /// RFC 3339 timestamp, e.g. `2026-01-01T00:00:00Z`
  pub at: String,
}

pub fn handle_find_at(args: FindAtArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let at = DateTime::parse_from_rfc3339(&args.at)
    .context("invalid --at timestamp, expected RFC 3339")?
    .to_utc();
  let coordinator = open_coordinator(config)?;
  let record = coordinator.find_at_timepoint_or_throw(&path, Timepoint::from_datetime(at))?;
  print_info(&format!(
    "'{path}' at {at}: start={} end={:?}",
    record.start, record.end
  ));
  Ok(())
}

#[derive(Args)]
pub struct FindChildrenArgs {
  pub path: String,

  /// Only direct children, not transitive descendants
  #[arg(long)]
  pub direct: bool,
}

pub fn handle_find_children(args: FindChildrenArgs, config: &StoreConfig) -> Result<()> {
  let path = BranchPath::new(args.path).context("invalid branch path")?;
  let coordinator = open_coordinator(config)?;
  let children = if args.direct {
    coordinator.find_direct_children(&path)?
  } else {
    coordinator.find_children(&path)?
  };

  if children.is_empty() {
    print_warning(&format!("no children found under '{path}'"));
    return Ok(());
  }
  for child in children {
    print_info(&format!("{} (state={:?})", child.record.path, child.state));
  }
  Ok(())
}
