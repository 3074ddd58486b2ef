//! Branch state derivation (§4.4): a pure function of `base`, `head`, and
//! the parent's `head`. No store access, no side effects.

use crate::record::BranchState;
use crate::timepoint::Timepoint;

/// Classify a branch's state relative to its parent.
///
/// `parent_head` is `None` for the root branch, which is always
/// [`BranchState::UpToDate`] regardless of its own `base`/`head`.
pub fn derive_state(base: Timepoint, head: Timepoint, parent_head: Option<Timepoint>) -> BranchState {
  let Some(parent_head) = parent_head else {
    return BranchState::UpToDate;
  };
  match (base == parent_head, head > base) {
    (true, false) => BranchState::UpToDate,
    (true, true) => BranchState::Forward,
    (false, false) => BranchState::Behind,
    (false, true) => BranchState::Diverged,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tp(seconds: i64) -> Timepoint {
    Timepoint::from_datetime(chrono::DateTime::from_timestamp(seconds, 0).unwrap())
  }

  #[test]
  fn root_ignores_parent() {
    assert_eq!(derive_state(tp(0), tp(0), None), BranchState::UpToDate);
  }

  #[test]
  fn matrix() {
    assert_eq!(derive_state(tp(100), tp(100), Some(tp(100))), BranchState::UpToDate);
    assert_eq!(derive_state(tp(100), tp(150), Some(tp(100))), BranchState::Forward);
    assert_eq!(derive_state(tp(100), tp(100), Some(tp(400))), BranchState::Behind);
    assert_eq!(derive_state(tp(100), tp(300), Some(tp(400))), BranchState::Diverged);
  }
}
