//! The commit coordinator: the branch lifecycle API and the only place
//! that opens, completes, or rolls back commits.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, instrument, warn};

use crate::commit::{Commit, CommitType};
use crate::error::BranchError;
use crate::listener::{CommitListener, ListenerRegistry};
use crate::path::BranchPath;
use crate::query::{Clause, Field, Paging, Query, Sort};
use crate::record::{Branch, BranchRecord};
use crate::store::BranchStore;
use crate::timepoint::Timepoint;

/// Opens, completes, and rolls back commits against a pluggable
/// [`BranchStore`]; exposes the branch lifecycle API.
///
/// Serializes `lock_branch`, `complete`, and `rollback` under a single
/// process-wide mutex, per the concurrency model: reads are not serialized
/// and rely on the store's own consistency. The mutex is a private field,
/// not a global, so a future implementation can swap it for a
/// compare-and-set or distributed lock without touching callers.
pub struct BranchCoordinator<S> {
  store: S,
  write_lock: Mutex<()>,
  listeners: Mutex<ListenerRegistry>,
}

impl<S: BranchStore> BranchCoordinator<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      write_lock: Mutex::new(()),
      listeners: Mutex::new(ListenerRegistry::new()),
    }
  }

  /// Borrow the underlying store, for callers that need direct query
  /// access (the CLI's `find-*` commands, for instance).
  pub fn store(&self) -> &S {
    &self.store
  }

  // ---- lookups -----------------------------------------------------

  fn current_query(path: &BranchPath) -> Query {
    Query::must(Clause::PathEq(path.clone())).and(Clause::Missing(Field::End))
  }

  fn current_record(&self, path: &BranchPath) -> Result<Option<BranchRecord>, BranchError> {
    let mut matches = self.store.query_for_list(&Self::current_query(path))?;
    match matches.len() {
      0 => Ok(None),
      1 => Ok(Some(matches.remove(0))),
      _ => Err(BranchError::InvariantViolation(format!(
        "more than one current timespan for path '{path}'"
      ))),
    }
  }

  fn parent_head(&self, path: &BranchPath) -> Result<Option<Timepoint>, BranchError> {
    let Some(parent) = path.parent() else {
      return Ok(None);
    };
    let parent_record = self
      .current_record(&parent)?
      .ok_or_else(|| BranchError::InvariantViolation(format!("parent branch '{parent}' has no current timespan")))?;
    Ok(Some(parent_record.head))
  }

  fn to_branch(&self, record: BranchRecord) -> Result<Branch, BranchError> {
    let parent_head = self.parent_head(&record.path)?;
    let state = record.state(parent_head);
    Ok(Branch { record, state })
  }

  /// The next commit timepoint for a branch currently at `head`: strictly
  /// greater than `head`, per §4.5.
  fn next_timepoint(head: Timepoint) -> Result<Timepoint, BranchError> {
    head
      .as_datetime()
      .checked_add_signed(chrono::Duration::nanoseconds(1))
      .map(Timepoint::from_datetime)
      .ok_or_else(|| BranchError::InvariantViolation("timepoint overflow".into()))
  }

  /// Does a current timespan exist at `path`?
  pub fn exists(&self, path: &BranchPath) -> Result<bool, BranchError> {
    Ok(self.current_record(path)?.is_some())
  }

  /// The current branch at `path`, with its derived state, or `None` if no
  /// current timespan exists.
  #[instrument(skip(self), fields(%path))]
  pub fn find_latest(&self, path: &BranchPath) -> Result<Option<Branch>, BranchError> {
    match self.current_record(path)? {
      Some(record) => Ok(Some(self.to_branch(record)?)),
      None => Ok(None),
    }
  }

  /// [`Self::find_latest`], failing with [`BranchError::BranchNotFound`]
  /// instead of returning `None`.
  pub fn find_branch_or_throw(&self, path: &BranchPath) -> Result<Branch, BranchError> {
    self
      .find_latest(path)?
      .ok_or_else(|| BranchError::BranchNotFound(path.clone()))
  }

  /// The unique timespan covering `at` for `path`.
  pub fn find_at_timepoint_or_throw(&self, path: &BranchPath, at: Timepoint) -> Result<BranchRecord, BranchError> {
    let query = Query::must(Clause::PathEq(path.clone()))
      .and(Clause::RangeLe(Field::Start, at))
      .or(Clause::Missing(Field::End))
      .or(Clause::RangeGt(Field::End, at));
    let mut matches = self.store.query_for_list(&query)?;
    match matches.len() {
      0 => Err(BranchError::BranchNotFound(path.clone())),
      1 => Ok(matches.remove(0)),
      _ => Err(BranchError::InvariantViolation(format!(
        "more than one timespan for path '{path}' at {at}"
      ))),
    }
  }

  /// Every branch with a current timespan, ordered by path and capped at
  /// [`Paging::DEFAULT_BOUND`] per §4.3.
  pub fn find_all(&self) -> Result<Vec<Branch>, BranchError> {
    let query = Query::must(Clause::Missing(Field::End))
      .sorted_by(Sort::ascending(Field::Path))
      .paged(Paging::default());
    let records = self.store.query_for_list(&query)?;
    records.into_iter().map(|r| self.to_branch(r)).collect()
  }

  /// Current timespans whose path has `path` as a literal prefix —
  /// transitive descendants included, not just direct children.
  pub fn find_children(&self, path: &BranchPath) -> Result<Vec<Branch>, BranchError> {
    let query = Query::must(Clause::PathPrefix(path.clone())).and(Clause::Missing(Field::End));
    let mut records = self.store.query_for_list(&query)?;
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records.into_iter().map(|r| self.to_branch(r)).collect()
  }

  /// [`Self::find_children`], filtered to paths exactly one segment below
  /// `path`.
  pub fn find_direct_children(&self, path: &BranchPath) -> Result<Vec<Branch>, BranchError> {
    let want_segments = path.segment_count() + 1;
    Ok(
      self
        .find_children(path)?
        .into_iter()
        .filter(|branch| branch.record.path.segment_count() == want_segments)
        .collect(),
    )
  }

  // ---- creation ------------------------------------------------------

  /// Create a new branch at `path`. Fails if `path` already has a current
  /// timespan, or if its parent does not exist.
  #[instrument(skip(self), fields(%path))]
  pub fn create(&self, path: &BranchPath) -> Result<BranchRecord, BranchError> {
    self.create_at(path, Timepoint::now(), false)
  }

  /// Like [`Self::create`], materializing any missing ancestors using the
  /// same commit timepoint so the whole ancestry shares a coherent
  /// `base`/`start`/`head`.
  #[instrument(skip(self), fields(%path))]
  pub fn recursive_create(&self, path: &BranchPath) -> Result<BranchRecord, BranchError> {
    self.create_at(path, Timepoint::now(), true)
  }

  fn create_at(&self, path: &BranchPath, at: Timepoint, recursive: bool) -> Result<BranchRecord, BranchError> {
    if self.current_record(path)?.is_some() {
      return Err(BranchError::BranchAlreadyExists(path.clone()));
    }

    // Non-root: base/start/head all start at the parent's current head, per
    // §4.2 — never at `at`, which is only the shared timepoint root itself
    // uses. The parent must exist (materialized above if this call is
    // recursive) before we can read its head.
    let origin = if let Some(parent) = path.parent() {
      if self.current_record(&parent)?.is_none() {
        if recursive {
          self.create_at(&parent, at, true)?;
        } else {
          return Err(BranchError::ParentNotFound(parent));
        }
      }
      self.parent_head(path)?.ok_or_else(|| {
        BranchError::InvariantViolation(format!("parent of '{path}' has no current timespan"))
      })?
    } else {
      at
    };

    let record = BranchRecord::new_branch(path.clone(), origin);
    self.store.save(record.clone())?;
    debug!(%path, %origin, "created branch");
    Ok(record)
  }

  // ---- commit lifecycle ----------------------------------------------

  /// Acquire the branch's write lock and open a commit of the given type
  /// against its current timespan. Locking is non-blocking: if already
  /// locked, this fails immediately rather than waiting.
  #[instrument(skip(self), fields(%path, ?commit_type))]
  pub fn open_commit(&self, path: &BranchPath, commit_type: CommitType) -> Result<Commit, BranchError> {
    let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut current = self
      .current_record(path)?
      .ok_or_else(|| BranchError::BranchNotFound(path.clone()))?;
    if current.locked {
      warn!(%path, "open_commit rejected: branch already locked");
      return Err(BranchError::BranchLocked(path.clone()));
    }

    let timepoint = Self::next_timepoint(current.head)?;

    current.locked = true;
    self.store.save(current.clone())?;
    debug!(%path, %timepoint, "lock acquired, commit opened");

    Ok(Commit::new(current, commit_type, timepoint))
  }

  /// [`Self::open_commit`] specialized for a rebase: records the branch's
  /// current `base` for later comparison and re-parents it onto the
  /// parent's current head.
  pub fn open_rebase_commit(&self, path: &BranchPath) -> Result<Commit, BranchError> {
    let mut commit = self.open_commit(path, CommitType::Rebase)?;
    if !path.is_root() {
      let parent_head = self.parent_head(path)?.ok_or_else(|| {
        BranchError::InvariantViolation(format!("parent of '{path}' has no current timespan"))
      })?;
      commit.rebase_previous_base = Some(commit.branch.base);
      commit.branch.base = parent_head;
    }
    Ok(commit)
  }

  /// [`Self::open_commit`] specialized for a promotion: `source_path` must
  /// be a strict descendant of `path` and is locked for the duration of
  /// the promotion, in addition to `path` itself, so a concurrent commit
  /// can't land on the source between the promotion's read and its write.
  #[instrument(skip(self), fields(%path, %source_path))]
  pub fn open_promotion_commit(&self, path: &BranchPath, source_path: &BranchPath) -> Result<Commit, BranchError> {
    if !path.is_ancestor_of(source_path) {
      return Err(BranchError::InvalidArgument(format!(
        "'{source_path}' is not a descendant of '{path}'"
      )));
    }

    let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut source = self
      .current_record(source_path)?
      .ok_or_else(|| BranchError::BranchNotFound(source_path.clone()))?;
    if source.locked {
      return Err(BranchError::BranchLocked(source_path.clone()));
    }
    let mut destination = self
      .current_record(path)?
      .ok_or_else(|| BranchError::BranchNotFound(path.clone()))?;
    if destination.locked {
      return Err(BranchError::BranchLocked(path.clone()));
    }

    let timepoint = Self::next_timepoint(destination.head)?;

    source.locked = true;
    destination.locked = true;
    self.store.save_all(vec![source, destination.clone()])?;
    info!(%path, %source_path, %timepoint, "promotion commit opened, source and destination locked");

    let mut commit = Commit::new(destination, CommitType::Promotion, timepoint);
    commit.source_path = Some(source_path.clone());
    Ok(commit)
  }

  /// Run listeners, close the old timespan, open a new one, and (for
  /// promotions) reset the source branch — all in one store batch.
  #[instrument(skip(self, commit), fields(path = %commit.path(), commit_type = ?commit.commit_type()))]
  pub fn complete(&self, commit: Commit) -> Result<BranchRecord, BranchError> {
    let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    self
      .listeners
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .fire(&commit)
      .map_err(|err| BranchError::ListenerAborted(err.to_string()))?;

    let entity_versions_replaced = commit.versions_replaced().clone();
    let Commit {
      mut branch,
      commit_type,
      timepoint,
      source_path,
      ..
    } = commit;

    branch.end = Some(timepoint);
    branch.locked = false;

    let mut new_timespan = BranchRecord {
      path: branch.path.clone(),
      base: branch.base,
      head: timepoint,
      start: timepoint,
      end: None,
      locked: false,
      contains_content: !matches!(commit_type, CommitType::Rebase) || branch.contains_content,
      last_promotion: branch.last_promotion,
      versions_replaced: branch.versions_replaced.union(&entity_versions_replaced).copied().collect(),
    };

    let mut to_save = vec![branch, new_timespan.clone()];

    if matches!(commit_type, CommitType::Promotion) {
      let source_path = source_path.ok_or_else(|| BranchError::InvalidArgument("promotion missing source path".into()))?;
      let mut source = self
        .current_record(&source_path)?
        .ok_or_else(|| BranchError::BranchNotFound(source_path.clone()))?;

      new_timespan.versions_replaced = new_timespan
        .versions_replaced
        .union(&source.versions_replaced)
        .copied()
        .collect();
      // reflect the merge in what we already queued for save
      if let Some(last) = to_save.last_mut() {
        *last = new_timespan.clone();
      }

      source.end = Some(timepoint);
      to_save.push(source);

      let reset_source = BranchRecord {
        path: source_path,
        base: timepoint,
        head: timepoint,
        start: timepoint,
        end: None,
        locked: false,
        contains_content: false,
        last_promotion: Some(timepoint),
        versions_replaced: Default::default(),
      };
      to_save.push(reset_source);
    }

    self.store.save_all(to_save)?;
    info!(path = %new_timespan.path, %timepoint, "commit completed");
    Ok(new_timespan)
  }

  /// Undo a commit that will not complete: delete any entity documents it
  /// speculatively wrote under its coordinates, then clear the lock.
  #[instrument(skip(self, commit), fields(path = %commit.path()))]
  pub fn rollback(&self, commit: Commit) -> Result<(), BranchError> {
    let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let path = commit.path().clone();
    let touched_query =
      Query::must(Clause::PathEq(path.clone())).and(Clause::Eq(Field::Start, commit.timepoint()));
    for kind in commit.touched_kinds() {
      self.store.delete_entities(kind, &touched_query)?;
    }

    let mut branch = commit.branch;
    branch.locked = false;
    self.store.save(branch)?;
    warn!(%path, "commit rolled back");
    Ok(())
  }

  /// Force-clear a branch's lock. Intended for operator recovery after a
  /// commit was abandoned without completing or rolling back, not for
  /// routine use.
  #[instrument(skip(self), fields(%path))]
  pub fn unlock(&self, path: &BranchPath) -> Result<(), BranchError> {
    let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut record = self
      .current_record(path)?
      .ok_or_else(|| BranchError::BranchNotFound(path.clone()))?;
    if !record.locked {
      return Err(BranchError::BranchNotLocked(path.clone()));
    }
    record.locked = false;
    self.store.save(record)?;
    warn!(%path, "branch force-unlocked");
    Ok(())
  }

  /// Register a listener, deduplicated by identity.
  pub fn add_commit_listener(&self, listener: Arc<dyn CommitListener>) {
    self
      .listeners
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .add(listener);
  }

  /// Delete every branch record. Destructive; intended for tests and
  /// administrative resets.
  pub fn delete_all(&self) -> Result<(), BranchError> {
    self.store.delete_all_branches()?;
    Ok(())
  }
}
