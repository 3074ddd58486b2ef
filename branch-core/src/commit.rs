//! The in-memory commit value: opened against a branch, mutated by the
//! caller as it writes entity documents, then consumed exactly once by
//! [`crate::coordinator::BranchCoordinator::complete`] or
//! [`crate::coordinator::BranchCoordinator::rollback`].
//!
//! Exactly-once completion falls out of ownership rather than a runtime
//! flag: `complete`/`rollback` take `Commit` by value, so a commit that has
//! been consumed cannot be consumed again.

use std::collections::BTreeSet;

use crate::path::BranchPath;
use crate::record::BranchRecord;
use crate::timepoint::{EntityVersionId, Timepoint};

/// What kind of commit is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
  /// An ordinary content change.
  Content,
  /// Re-parents the branch onto its parent's current head; carries no new
  /// content of its own.
  Rebase,
  /// Pushes a descendant branch's replaced versions into this branch and
  /// resets the descendant.
  Promotion,
}

/// A transient unit of work opened against a branch's current timespan.
#[derive(Debug)]
pub struct Commit {
  pub(crate) branch: BranchRecord,
  pub(crate) commit_type: CommitType,
  pub(crate) timepoint: Timepoint,
  pub(crate) source_path: Option<BranchPath>,
  pub(crate) rebase_previous_base: Option<Timepoint>,
  entity_versions_replaced: BTreeSet<EntityVersionId>,
  touched_entity_kinds: BTreeSet<String>,
}

impl Commit {
  pub(crate) fn new(branch: BranchRecord, commit_type: CommitType, timepoint: Timepoint) -> Self {
    Self {
      branch,
      commit_type,
      timepoint,
      source_path: None,
      rebase_previous_base: None,
      entity_versions_replaced: BTreeSet::new(),
      touched_entity_kinds: BTreeSet::new(),
    }
  }

  /// Path of the branch this commit is open against.
  pub fn path(&self) -> &BranchPath {
    &self.branch.path
  }

  /// The commit's assigned timepoint, strictly greater than the branch's
  /// `head` at open time.
  pub const fn timepoint(&self) -> Timepoint {
    self.timepoint
  }

  /// The kind of commit this is.
  pub const fn commit_type(&self) -> CommitType {
    self.commit_type
  }

  /// Source path, set for [`CommitType::Promotion`] only.
  pub fn source_path(&self) -> Option<&BranchPath> {
    self.source_path.as_ref()
  }

  /// Record that this commit's changes replace the given entity version.
  /// Called by the client after writing the corresponding entity document
  /// under the commit's coordinates.
  pub fn record_version_replaced(&mut self, id: EntityVersionId) {
    self.entity_versions_replaced.insert(id);
  }

  /// Record that this commit touched a domain entity kind, so rollback
  /// knows which store to issue a cleanup delete against.
  pub fn record_touched_kind(&mut self, kind: impl Into<String>) {
    self.touched_entity_kinds.insert(kind.into());
  }

  pub(crate) fn versions_replaced(&self) -> &BTreeSet<EntityVersionId> {
    &self.entity_versions_replaced
  }

  pub(crate) fn touched_kinds(&self) -> &BTreeSet<String> {
    &self.touched_entity_kinds
  }
}
