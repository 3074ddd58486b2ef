//! A pre-wired coordinator over an in-memory store, for tests that need a
//! branch namespace to already exist rather than building one by hand.

use branch_core::coordinator::BranchCoordinator;
use branch_core::path::BranchPath;
use branch_core::record::BranchRecord;
use branch_store::InMemoryBranchStore;

/// Wraps a [`BranchCoordinator`] over a fresh [`InMemoryBranchStore`].
pub struct InMemoryStoreGuard {
  pub coordinator: BranchCoordinator<InMemoryBranchStore>,
}

impl InMemoryStoreGuard {
  /// An empty store with no branches at all, not even `MAIN`.
  pub fn new() -> Self {
    Self {
      coordinator: BranchCoordinator::new(InMemoryBranchStore::new()),
    }
  }

  /// A store with just `MAIN` created.
  pub fn seeded_main() -> Self {
    let guard = Self::new();
    guard
      .coordinator
      .create(&BranchPath::root())
      .expect("creating MAIN on a fresh store cannot fail");
    guard
  }

  /// `seeded_main`, plus every path in `paths` created via
  /// `recursive_create`, in order.
  pub fn seeded_with(paths: &[&str]) -> Self {
    let guard = Self::seeded_main();
    for raw in paths {
      let path = BranchPath::new(*raw).expect("fixture path must be valid");
      guard
        .coordinator
        .recursive_create(&path)
        .unwrap_or_else(|err| panic!("failed to seed path '{raw}': {err}"));
    }
    guard
  }
}

impl Default for InMemoryStoreGuard {
  fn default() -> Self {
    Self::new()
  }
}

/// Assert that a path's timespans, taken together, form a contiguous chain:
/// consecutive timespans satisfy `prev.end == next.start`, and only the
/// last (by `start`) has no `end`.
pub fn assert_timespan_contiguity(records: &[BranchRecord]) {
  let mut sorted: Vec<&BranchRecord> = records.iter().collect();
  sorted.sort_by_key(|r| r.start);

  for window in sorted.windows(2) {
    let [prev, next] = window else { unreachable!() };
    assert_eq!(
      prev.end,
      Some(next.start),
      "timespan gap: '{}' ends at {:?} but next starts at {}",
      prev.path,
      prev.end,
      next.start
    );
  }

  let open_ended = sorted.iter().filter(|r| r.end.is_none()).count();
  assert!(
    open_ended <= 1,
    "expected at most one current timespan, found {open_ended}"
  );
}
