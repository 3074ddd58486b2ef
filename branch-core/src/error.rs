//! Structured domain errors.
//!
//! `branch-core` never reaches for `anyhow`: every failure mode a caller
//! needs to match on (lock contention, divergence, not-found) is a named
//! variant here. `anyhow` lives one layer up, in `branch-cli`, where errors
//! are reported rather than matched.

use thiserror::Error;

use crate::path::BranchPath;

/// Errors produced by the branch-versioning engine.
#[derive(Debug, Error)]
pub enum BranchError {
  /// A caller-supplied argument failed validation.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// No branch exists at the given path.
  #[error("no branch exists at path '{0}'")]
  BranchNotFound(BranchPath),

  /// A branch already exists at the given path.
  #[error("branch already exists at path '{0}'")]
  BranchAlreadyExists(BranchPath),

  /// The branch's parent does not exist, so it cannot be created.
  #[error("parent branch '{0}' does not exist")]
  ParentNotFound(BranchPath),

  /// The branch is already locked by an open commit.
  #[error("branch '{0}' is already locked")]
  BranchLocked(BranchPath),

  /// An operation that required a lock found none held.
  #[error("branch '{0}' is not locked")]
  BranchNotLocked(BranchPath),

  /// A rebase or promotion source branch has diverged from its parent in a
  /// way that cannot be resolved automatically.
  #[error("branch '{0}' has diverged from '{1}' and cannot be rebased automatically")]
  Diverged(BranchPath, BranchPath),

  /// A data-model invariant was found broken: more than one current
  /// timespan for a path, more than one timespan at a queried timepoint, or
  /// a non-root branch whose parent has no current timespan.
  #[error("invariant violation: {0}")]
  InvariantViolation(String),

  /// A pre-completion listener rejected the commit; it was not completed.
  #[error("commit listener aborted completion: {0}")]
  ListenerAborted(String),

  /// The underlying document store reported a failure.
  #[error("store error: {0}")]
  Store(#[from] crate::store::StoreError),
}
