//! An in-memory [`BranchStore`] with optional JSON-snapshot persistence: a
//! plain `Vec` guarded by a mutex, serialized to a single JSON file on
//! demand rather than backed by a real document store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use branch_core::query::{Clause, Field, Query, Sort, SortOrder};
use branch_core::record::BranchRecord;
use branch_core::store::{BranchStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One domain-entity document write recorded against a branch's
/// coordinates, purely so [`InMemoryBranchStore::delete_entities`] has
/// something to clean up on rollback. The entity document's actual content
/// is owned by a layer outside this crate; only its placement is tracked
/// here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct EntityMarker {
  kind: String,
  path: String,
  start: branch_core::timepoint::Timepoint,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
  records: Vec<BranchRecord>,
  #[serde(default)]
  entity_markers: Vec<EntityMarker>,
}

/// In-memory implementation of [`BranchStore`], suitable for tests, the
/// CLI, and embedding without a real backing document store.
#[derive(Default)]
pub struct InMemoryBranchStore {
  inner: Mutex<Snapshot>,
}

impl InMemoryBranchStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load a previously saved snapshot from disk, or start empty if the
  /// file does not exist.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
      return Ok(Self::new());
    }
    let content = fs::read_to_string(path).map_err(|err| StoreError::Io(err.to_string()))?;
    let snapshot: Snapshot = serde_json::from_str(&content).map_err(|err| StoreError::Serialization(err.to_string()))?;
    Ok(Self {
      inner: Mutex::new(snapshot),
    })
  }

  /// Persist the current state as a JSON snapshot.
  pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
    }
    let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let content = serde_json::to_string_pretty(&*guard).map_err(|err| StoreError::Serialization(err.to_string()))?;
    fs::write(&path, content).map_err(|err| StoreError::Io(err.to_string()))?;
    debug!(path = %path.display(), records = guard.records.len(), "wrote store snapshot");
    Ok(())
  }

  /// Record that `entity_kind` was written at `(path, start)`, so a later
  /// rollback's `delete_entities` has something to find. Test- and
  /// CLI-facing; real store adapters would have the entity layer write
  /// directly instead of going through this marker table.
  pub fn record_entity_write(&self, entity_kind: &str, path: &str, start: branch_core::timepoint::Timepoint) {
    let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.entity_markers.push(EntityMarker {
      kind: entity_kind.to_string(),
      path: path.to_string(),
      start,
    });
  }

  fn matches(record: &BranchRecord, query: &Query) -> bool {
    let must_ok = query.must.iter().all(|clause| Self::matches_clause(record, clause));
    let should_ok = query.should.is_empty() || query.should.iter().any(|clause| Self::matches_clause(record, clause));
    let must_not_ok = !query.must_not.iter().any(|clause| Self::matches_clause(record, clause));
    must_ok && should_ok && must_not_ok
  }

  fn matches_clause(record: &BranchRecord, clause: &Clause) -> bool {
    match clause {
      Clause::PathEq(path) => &record.path == path,
      Clause::PathPrefix(path) => path.is_ancestor_of(&record.path),
      Clause::Eq(field, value) => Self::field_timepoint(record, *field).is_some_and(|t| t == *value),
      Clause::RangeLe(field, value) => Self::field_timepoint(record, *field).is_some_and(|t| t <= *value),
      Clause::RangeGt(field, value) => Self::field_timepoint(record, *field).is_some_and(|t| t > *value),
      Clause::Exists(field) => Self::field_timepoint(record, *field).is_some(),
      Clause::Missing(field) => Self::field_timepoint(record, *field).is_none(),
    }
  }

  fn field_timepoint(record: &BranchRecord, field: Field) -> Option<branch_core::timepoint::Timepoint> {
    match field {
      Field::Start => Some(record.start),
      Field::End => record.end,
      Field::Path => None,
    }
  }

  /// Sort matched records in place per a [`Sort`] directive. `Field::Path`
  /// sorts lexicographically on the path string; the timepoint fields sort
  /// on [`Self::field_timepoint`], with absent values (e.g. a current
  /// timespan's `end`) ordering first.
  fn sort_records(records: &mut [BranchRecord], sort: Sort) {
    records.sort_by(|a, b| {
      let ordering = match sort.field {
        Field::Path => a.path.as_str().cmp(b.path.as_str()),
        field => Self::field_timepoint(a, field).cmp(&Self::field_timepoint(b, field)),
      };
      match sort.order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
      }
    });
  }
}

impl BranchStore for InMemoryBranchStore {
  fn count(&self, query: &Query) -> Result<u64, StoreError> {
    let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(guard.records.iter().filter(|r| Self::matches(r, query)).count() as u64)
  }

  fn query_for_list(&self, query: &Query) -> Result<Vec<BranchRecord>, StoreError> {
    let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut matches: Vec<BranchRecord> = guard
      .records
      .iter()
      .filter(|r| Self::matches(r, query))
      .cloned()
      .collect();

    if let Some(sort) = query.sort {
      Self::sort_records(&mut matches, sort);
    }

    if let Some(paging) = query.paging {
      let start = paging.offset.min(matches.len());
      let end = start.saturating_add(paging.size).min(matches.len());
      matches.truncate(end);
      matches.drain(..start);
    }

    Ok(matches)
  }

  fn save_all(&self, records: Vec<BranchRecord>) -> Result<(), StoreError> {
    let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for record in records {
      match guard
        .records
        .iter_mut()
        .find(|existing| existing.path == record.path && existing.start == record.start)
      {
        Some(slot) => *slot = record,
        None => guard.records.push(record),
      }
    }
    Ok(())
  }

  fn delete_entities(&self, entity_kind: &str, query: &Query) -> Result<u64, StoreError> {
    let path_filter: Vec<String> = query
      .must
      .iter()
      .filter_map(|clause| match clause {
        Clause::PathEq(path) => Some(path.as_str().to_string()),
        _ => None,
      })
      .collect();
    let start_filter = query.must.iter().find_map(|clause| match clause {
      Clause::Eq(Field::Start, value) => Some(*value),
      _ => None,
    });

    let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let before = guard.entity_markers.len();
    guard.entity_markers.retain(|marker| {
      let matches = marker.kind == entity_kind
        && path_filter.contains(&marker.path)
        && start_filter.is_none_or(|start| marker.start == start);
      !matches
    });
    Ok((before - guard.entity_markers.len()) as u64)
  }

  fn delete_all_branches(&self) -> Result<(), StoreError> {
    let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.records.clear();
    guard.entity_markers.clear();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use branch_core::path::BranchPath;
  use branch_core::timepoint::Timepoint;
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn save_and_query_roundtrip() {
    let store = InMemoryBranchStore::new();
    let path = BranchPath::root();
    let record = BranchRecord::new_branch(path.clone(), Timepoint::now());
    store.save(record.clone()).unwrap();

    let query = Query::must(Clause::PathEq(path)).and(Clause::Missing(Field::End));
    let found = store.query_for_list(&query).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0], record);
  }

  #[test]
  fn persists_to_disk_and_reloads() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("store.json");

    let store = InMemoryBranchStore::new();
    let path = BranchPath::new("MAIN/A").unwrap();
    store.save(BranchRecord::new_branch(path.clone(), Timepoint::now())).unwrap();
    store.save_to(&snapshot_path).unwrap();

    let reloaded = InMemoryBranchStore::load(&snapshot_path).unwrap();
    assert!(reloaded.count(&Query::default()).unwrap() >= 1);
    let found = reloaded
      .query_for_list(&Query::must(Clause::PathEq(path)))
      .unwrap();
    assert_eq!(found.len(), 1);
  }

  #[test]
  fn delete_entities_matches_recorded_markers() {
    let store = InMemoryBranchStore::new();
    let path = BranchPath::new("MAIN/A").unwrap();
    let at = Timepoint::now();
    store.record_entity_write("widget", path.as_str(), at);

    let query = Query::must(Clause::PathEq(path));
    let deleted = store.delete_entities("widget", &query).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.delete_entities("widget", &query).unwrap(), 0);
  }
}
