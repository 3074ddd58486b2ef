//! Integration scenarios for branch creation, commits, rebases, and
//! promotions, exercised end to end against the in-memory store.

use branch_core::error::BranchError;
use branch_core::path::BranchPath;
use branch_core::query::{Clause, Field, Query};
use branch_core::record::BranchState;
use branch_core::store::BranchStore;
use branch_core::timepoint::EntityVersionId;
use branch_test_utils::{InMemoryStoreGuard, assert_timespan_contiguity};

fn path(raw: &str) -> BranchPath {
  BranchPath::new(raw).unwrap()
}

#[test]
fn create_root_is_up_to_date() {
  let guard = InMemoryStoreGuard::new();
  let record = guard.coordinator.create(&BranchPath::root()).unwrap();
  assert_eq!(record.base, record.head);
  assert_eq!(record.start, record.head);

  let latest = guard.coordinator.find_latest(&BranchPath::root()).unwrap().unwrap();
  assert_eq!(latest.state, BranchState::UpToDate);
}

#[test]
fn recursive_create_shares_one_timepoint_across_ancestry() {
  let guard = InMemoryStoreGuard::seeded_main();
  let leaf = path("MAIN/A/B");
  let record = guard.coordinator.recursive_create(&leaf).unwrap();

  let a = guard.coordinator.find_branch_or_throw(&path("MAIN/A")).unwrap();
  assert_eq!(a.record.base, record.base);
  assert_eq!(a.record.head, record.head);
  assert_eq!(a.state, BranchState::UpToDate);
}

#[test]
fn create_without_parent_fails_non_recursive() {
  let guard = InMemoryStoreGuard::seeded_main();
  let err = guard.coordinator.create(&path("MAIN/A/B")).unwrap_err();
  assert!(matches!(err, BranchError::ParentNotFound(_)));
}

#[test]
fn content_commit_replaces_timespan_and_marks_content() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A/B"]);
  let leaf = path("MAIN/A/B");

  let mut commit = guard.coordinator.open_commit(&leaf, branch_core::CommitType::Content).unwrap();
  commit.record_version_replaced(EntityVersionId::new());
  let new_timespan = guard.coordinator.complete(commit).unwrap();

  assert!(new_timespan.contains_content);
  assert_eq!(new_timespan.versions_replaced.len(), 1);

  let all = guard
    .coordinator
    .store()
    .query_for_list(&Query::must(Clause::PathEq(leaf.clone())))
    .unwrap();
  assert_eq!(all.len(), 2, "old and new timespan should both be persisted");
  assert_timespan_contiguity(&all);
}

#[test]
fn divergence_after_parent_advances() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A/B"]);
  let leaf = path("MAIN/A/B");

  // commit on the leaf: FORWARD relative to its (unmoved) parent `MAIN/A`
  let commit = guard.coordinator.open_commit(&leaf, branch_core::CommitType::Content).unwrap();
  guard.coordinator.complete(commit).unwrap();

  // now advance MAIN/A itself
  let parent = path("MAIN/A");
  let parent_commit = guard
    .coordinator
    .open_commit(&parent, branch_core::CommitType::Content)
    .unwrap();
  guard.coordinator.complete(parent_commit).unwrap();

  let leaf_state = guard.coordinator.find_latest(&leaf).unwrap().unwrap();
  assert_eq!(leaf_state.state, BranchState::Diverged);
}

#[test]
fn rebase_adopts_parent_head_and_preserves_contains_content() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A/B"]);
  let leaf = path("MAIN/A/B");
  let parent = path("MAIN/A");

  let content_commit = guard.coordinator.open_commit(&leaf, branch_core::CommitType::Content).unwrap();
  guard.coordinator.complete(content_commit).unwrap();

  let parent_commit = guard
    .coordinator
    .open_commit(&parent, branch_core::CommitType::Content)
    .unwrap();
  let advanced_parent = guard.coordinator.complete(parent_commit).unwrap();

  let rebase = guard.coordinator.open_rebase_commit(&leaf).unwrap();
  assert_eq!(rebase.path(), &leaf);
  let rebased = guard.coordinator.complete(rebase).unwrap();

  assert_eq!(rebased.base, advanced_parent.head);
  assert!(rebased.contains_content, "rebase alone must not clear prior content");

  // the rebase commit itself assigns a fresh head strictly past the
  // adopted base, so the branch reads as FORWARD, not UpToDate, until the
  // parent catches back up or this branch is rebased again
  let latest = guard.coordinator.find_latest(&leaf).unwrap().unwrap();
  assert_eq!(latest.state, BranchState::Forward);
}

#[test]
fn promotion_merges_versions_and_resets_source() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A"]);
  let parent = path("MAIN/A");
  let source = path("MAIN/A/B");
  guard.coordinator.recursive_create(&source).unwrap();

  let mut source_commit = guard
    .coordinator
    .open_commit(&source, branch_core::CommitType::Content)
    .unwrap();
  let replaced = EntityVersionId::new();
  source_commit.record_version_replaced(replaced);
  guard.coordinator.complete(source_commit).unwrap();

  let promotion = guard.coordinator.open_promotion_commit(&parent, &source).unwrap();
  let promoted_parent = guard.coordinator.complete(promotion).unwrap();

  assert!(promoted_parent.versions_replaced.contains(&replaced));

  let reset_source = guard.coordinator.find_latest(&source).unwrap().unwrap();
  assert!(!reset_source.contains_content);
  assert_eq!(reset_source.last_promotion, Some(reset_source.head));
  assert_eq!(reset_source.base, reset_source.head);
  assert_eq!(reset_source.start, reset_source.head);
}

#[test]
fn second_open_commit_conflicts_while_locked() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();

  let _open = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();
  let err = guard
    .coordinator
    .open_commit(&root, branch_core::CommitType::Content)
    .unwrap_err();
  assert!(matches!(err, BranchError::BranchLocked(_)));
}

#[test]
fn rollback_clears_lock_and_leaves_timespan_unchanged() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();

  let before = guard.coordinator.find_latest(&root).unwrap().unwrap().record;
  let commit = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();
  guard.coordinator.rollback(commit).unwrap();

  let after = guard.coordinator.find_latest(&root).unwrap().unwrap().record;
  assert_eq!(before.base, after.base);
  assert_eq!(before.head, after.head);
  assert_eq!(before.start, after.start);
  assert!(!after.locked);

  // the branch can be committed against again after rollback
  let reopened = guard.coordinator.open_commit(&root, branch_core::CommitType::Content);
  assert!(reopened.is_ok());
}

#[test]
fn unlock_forces_lock_clear() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();
  let _open = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();

  guard.coordinator.unlock(&root).unwrap();
  let latest = guard.coordinator.find_latest(&root).unwrap().unwrap();
  assert!(!latest.record.locked);
}

#[test]
fn find_children_is_transitive_prefix_find_direct_children_is_not() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A/B"]);

  let children = guard.coordinator.find_children(&path("MAIN")).unwrap();
  let paths: Vec<String> = children.iter().map(|b| b.record.path.to_string()).collect();
  assert!(paths.contains(&"MAIN/A".to_string()));
  assert!(paths.contains(&"MAIN/A/B".to_string()));

  let direct = guard.coordinator.find_direct_children(&path("MAIN")).unwrap();
  let direct_paths: Vec<String> = direct.iter().map(|b| b.record.path.to_string()).collect();
  assert_eq!(direct_paths, vec!["MAIN/A".to_string()]);
}

#[test]
fn promotion_into_non_ancestor_is_rejected() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A", "MAIN/B"]);
  let err = guard
    .coordinator
    .open_promotion_commit(&path("MAIN/A"), &path("MAIN/B"))
    .unwrap_err();
  assert!(matches!(err, BranchError::InvalidArgument(_)));
}

#[test]
fn rollback_deletes_only_entities_written_at_the_commits_timepoint() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();

  let commit = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();
  let commit_timepoint = commit.timepoint();
  guard
    .coordinator
    .store()
    .record_entity_write("widget", root.as_str(), commit_timepoint);
  // a document from some earlier, already-completed commit must survive
  guard
    .coordinator
    .store()
    .record_entity_write("widget", root.as_str(), branch_core::timepoint::Timepoint::epoch());

  let mut commit = commit;
  commit.record_touched_kind("widget");
  guard.coordinator.rollback(commit).unwrap();

  let remaining = guard
    .coordinator
    .store()
    .delete_entities("widget", &Query::must(Clause::PathEq(root.clone())))
    .unwrap();
  assert_eq!(remaining, 1, "only the speculative write at the commit's timepoint should have been rolled back");
}

#[test]
fn find_at_timepoint_resolves_the_timespan_covering_the_instant() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();
  let created_at = guard.coordinator.find_branch_or_throw(&root).unwrap().record.start;

  let commit = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();
  let commit_timepoint = commit.timepoint();
  guard.coordinator.complete(commit).unwrap();

  let original = guard.coordinator.find_at_timepoint_or_throw(&root, created_at).unwrap();
  assert_eq!(original.end, Some(commit_timepoint));

  let current = guard.coordinator.find_at_timepoint_or_throw(&root, commit_timepoint).unwrap();
  assert!(current.is_current());
}

#[test]
fn find_at_timepoint_fails_for_a_path_with_no_history_there() {
  let guard = InMemoryStoreGuard::seeded_main();
  let err = guard
    .coordinator
    .find_at_timepoint_or_throw(&BranchPath::root(), branch_core::timepoint::Timepoint::epoch())
    .unwrap_err();
  assert!(matches!(err, BranchError::BranchNotFound(_)));
}

struct RefusingListener;

impl branch_core::listener::CommitListener for RefusingListener {
  fn pre_commit_completion(&self, _commit: &branch_core::Commit) -> Result<(), BranchError> {
    Err(BranchError::ListenerAborted("policy check failed".into()))
  }
}

#[test]
fn a_listener_failure_aborts_completion_and_leaves_the_branch_locked() {
  let guard = InMemoryStoreGuard::seeded_main();
  let root = BranchPath::root();
  guard
    .coordinator
    .add_commit_listener(std::sync::Arc::new(RefusingListener));

  let commit = guard.coordinator.open_commit(&root, branch_core::CommitType::Content).unwrap();
  let err = guard.coordinator.complete(commit).unwrap_err();
  assert!(matches!(err, BranchError::ListenerAborted(_)));

  // the commit was consumed by the failed complete; the branch is still
  // locked until the caller rolls back or force-unlocks
  let latest = guard.coordinator.find_latest(&root).unwrap().unwrap();
  assert!(latest.record.locked);
  guard.coordinator.unlock(&root).unwrap();
}

#[test]
fn duplicate_listener_registration_fires_once_during_a_real_commit() {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct CountingListener(Arc<AtomicUsize>);
  impl branch_core::listener::CommitListener for CountingListener {
    fn pre_commit_completion(&self, _commit: &branch_core::Commit) -> Result<(), BranchError> {
      self.0.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  let guard = InMemoryStoreGuard::seeded_main();
  let count = Arc::new(AtomicUsize::new(0));
  let listener: Arc<dyn branch_core::listener::CommitListener> = Arc::new(CountingListener(count.clone()));
  guard.coordinator.add_commit_listener(listener.clone());
  guard.coordinator.add_commit_listener(listener);

  let commit = guard.coordinator.open_commit(&BranchPath::root(), branch_core::CommitType::Content).unwrap();
  guard.coordinator.complete(commit).unwrap();
  assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn delete_all_clears_every_branch() {
  let guard = InMemoryStoreGuard::seeded_with(&["MAIN/A/B"]);
  guard.coordinator.delete_all().unwrap();
  assert!(!guard.coordinator.exists(&BranchPath::root()).unwrap());
  assert!(guard.coordinator.find_all().unwrap().is_empty());
}
