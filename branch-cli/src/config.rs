//! Configuration directory resolution for the CLI's persisted store.
//!
//! XDG-ish resolution via the `directories` crate rather than hand-rolled
//! path joining, with a single JSON snapshot file underneath the data
//! directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Resolved directories and the path to the store's JSON snapshot.
#[derive(Debug, Clone)]
pub struct StoreConfig {
  pub data_dir: PathBuf,
  pub state_path: PathBuf,
}

impl StoreConfig {
  /// Resolve the default, platform-appropriate config location.
  pub fn resolve() -> Result<Self> {
    let proj_dirs =
      ProjectDirs::from("eddieland", "", "branch-cli").context("failed to determine project directories")?;
    let data_dir = proj_dirs.data_dir().to_path_buf();
    let state_path = data_dir.join("store.json");
    Ok(Self { data_dir, state_path })
  }

  /// Override the state file path directly, for tests and `--state-path`.
  pub fn at_path(state_path: PathBuf) -> Self {
    let data_dir = state_path
      .parent()
      .map(std::path::Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));
    Self { data_dir, state_path }
  }
}
