//! The branch timespan record: the unit actually persisted to the store.

use std::collections::BTreeSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::path::BranchPath;
use crate::timepoint::{EntityVersionId, Timepoint};

/// A branch's state relative to its parent, computed from `base`/`head`/
/// parent `head`. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchState {
  /// `base == parent.head` and `head == base`: nothing has changed on
  /// either side since this branch was last rebased.
  UpToDate,
  /// `base == parent.head` and `head > base`: this branch has committed
  /// content the parent has not seen.
  Forward,
  /// `base < parent.head` and `head == base`: the parent has moved on and
  /// this branch has not.
  Behind,
  /// `base < parent.head` and `head > base`: both sides have moved.
  Diverged,
}

/// One immutable record in a branch's history.
///
/// A branch on disk is not a single row but a sequence of these sharing a
/// `path`; exactly one per path has `end == None` (the current timespan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
  pub path: BranchPath,
  pub base: Timepoint,
  pub head: Timepoint,
  pub start: Timepoint,
  pub end: Option<Timepoint>,
  pub locked: bool,
  pub contains_content: bool,
  pub last_promotion: Option<Timepoint>,
  pub versions_replaced: BTreeSet<EntityVersionId>,
}

impl BranchRecord {
  /// True when this is the current (unsuperseded) timespan for its path.
  pub const fn is_current(&self) -> bool {
    self.end.is_none()
  }

  /// Build the freshly-created timespan for a brand new branch: `base ==
  /// start == head == at`, no content, unlocked, no replaced versions.
  pub fn new_branch(path: BranchPath, at: Timepoint) -> Self {
    Self {
      path,
      base: at,
      head: at,
      start: at,
      end: None,
      locked: false,
      contains_content: false,
      last_promotion: None,
      versions_replaced: BTreeSet::new(),
    }
  }

  /// Classify this branch's state relative to its parent's head. `MAIN` is
  /// always [`BranchState::UpToDate`].
  pub fn state(&self, parent_head: Option<Timepoint>) -> BranchState {
    if self.path.is_root() {
      return BranchState::UpToDate;
    }
    crate::state::derive_state(self.base, self.head, parent_head)
  }
}

/// A current timespan paired with its derived, never-persisted state.
///
/// Returned by lookups that need to tell a caller not just what a branch
/// looks like but where it stands relative to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
  pub record: BranchRecord,
  pub state: BranchState,
}

impl Deref for Branch {
  type Target = BranchRecord;

  fn deref(&self) -> &BranchRecord {
    &self.record
  }
}
