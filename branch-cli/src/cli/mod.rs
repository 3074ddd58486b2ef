//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for the branch-cli tool:
//! subcommands mirroring the branch lifecycle API over a JSON-file-backed
//! in-memory store.

mod create;
mod delete_all;
mod exists;
mod find;
mod unlock;

use anyhow::{Context, Result};
use branch_core::coordinator::BranchCoordinator;
use branch_store::InMemoryBranchStore;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};

use crate::config::StoreConfig;
use crate::output::ColorMode;

/// Top-level CLI command for the branch-versioning service.
#[derive(Parser)]
#[command(name = "branch-cli")]
#[command(display_name = "🌿 branch-cli")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Operate a versioned branch service by hand")]
#[command(
  long_about = "branch-cli exposes the branch lifecycle API (create, find, unlock, ...) over a\n\
        JSON-file-backed in-memory store, for manual inspection and administration of a\n\
        branch namespace without wiring up a real document store."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightGreen.on_default().bold().underline())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightGreen.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(long, value_enum, ignore_case = true, default_value_t = ColorMode::Auto)]
  pub colors: ColorMode,

  /// Override the store's JSON snapshot path instead of using the
  /// platform default data directory
  #[arg(long)]
  pub state_path: Option<std::path::PathBuf>,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Create a new branch at a path
  Create(create::CreateArgs),
  /// Does a branch have a current timespan?
  Exists(exists::ExistsArgs),
  /// Show the current branch at a path, with its derived state
  FindLatest(find::FindLatestArgs),
  /// Show the timespan covering a path at a given instant
  FindAt(find::FindAtArgs),
  /// List descendant branches under a path
  FindChildren(find::FindChildrenArgs),
  /// Force-clear a branch's lock (recovery, not routine use)
  Unlock(unlock::UnlockArgs),
  /// Delete every branch record
  DeleteAll(delete_all::DeleteAllArgs),
}

pub fn handle_cli(cli: Cli) -> Result<()> {
  match cli.colors {
    ColorMode::Always | ColorMode::Yes => owo_colors::set_override(true),
    ColorMode::Never | ColorMode::No => owo_colors::set_override(false),
    ColorMode::Auto => {}
  }

  let config = match cli.state_path {
    Some(state_path) => StoreConfig::at_path(state_path),
    None => StoreConfig::resolve()?,
  };

  match cli.command {
    Commands::Create(args) => create::handle_create(args, &config),
    Commands::Exists(args) => exists::handle_exists(args, &config),
    Commands::FindLatest(args) => find::handle_find_latest(args, &config),
    Commands::FindAt(args) => find::handle_find_at(args, &config),
    Commands::FindChildren(args) => find::handle_find_children(args, &config),
    Commands::Unlock(args) => unlock::handle_unlock(args, &config),
    Commands::DeleteAll(args) => delete_all::handle_delete_all(args, &config),
  }
}

/// Load the store's JSON snapshot (or start empty) and wire a coordinator
/// over it. Every command reopens the store fresh since the CLI process
/// does not stay resident between invocations.
pub(crate) fn open_coordinator(config: &StoreConfig) -> Result<BranchCoordinator<InMemoryBranchStore>> {
  let store = InMemoryBranchStore::load(&config.state_path)
    .with_context(|| format!("failed to load store snapshot at {}", config.state_path.display()))?;
  Ok(BranchCoordinator::new(store))
}

/// Persist the coordinator's store back to its snapshot file.
pub(crate) fn persist(coordinator: &BranchCoordinator<InMemoryBranchStore>, config: &StoreConfig) -> Result<()> {
  coordinator
    .store()
    .save_to(&config.state_path)
    .with_context(|| format!("failed to write store snapshot to {}", config.state_path.display()))
}
