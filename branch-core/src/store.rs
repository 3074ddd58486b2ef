//! The store boundary: what the coordinator requires of a backing document
//! store, and nothing more.
//!
//! `BranchStore` lives in this crate (rather than in `branch-store`) because
//! the coordinator takes it as a generic bound — putting the trait in a
//! downstream crate would make `branch-core` depend on `branch-store` while
//! `branch-store`'s concrete implementation needs `branch-core`'s record and
//! query types, a cycle. `branch-store` depends on `branch-core` and
//! supplies `InMemoryBranchStore`; real backing stores implement this trait
//! directly against their own crate.

use thiserror::Error;

use crate::query::Query;
use crate::record::BranchRecord;

/// Failures a [`BranchStore`] implementation may report.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store I/O error: {0}")]
  Io(String),

  #[error("store serialization error: {0}")]
  Serialization(String),

  #[error("store record not found")]
  NotFound,
}

/// The document-store contract the commit coordinator is built against.
///
/// Kept deliberately small: counting, listing, saving, and deleting by
/// query. Everything about branch semantics (locking, state derivation,
/// timespan chaining) lives above this boundary in the coordinator.
pub trait BranchStore: Send + Sync {
  /// Count records matching `query`.
  fn count(&self, query: &Query) -> Result<u64, StoreError>;

  /// List records matching `query`, honoring `query`'s implicit ordering by
  /// insertion unless the caller sorts downstream. Bounded by `paging` when
  /// the caller supplies one.
  fn query_for_list(&self, query: &Query) -> Result<Vec<BranchRecord>, StoreError>;

  /// Persist a single record, inserting or overwriting by `(path, start)`.
  fn save(&self, record: BranchRecord) -> Result<(), StoreError> {
    self.save_all(vec![record])
  }

  /// Persist a batch of records. Implementations should make this
  /// best-effort atomic across the batch.
  fn save_all(&self, records: Vec<BranchRecord>) -> Result<(), StoreError>;

  /// Delete domain-entity documents of `entity_kind` recorded under
  /// `(path, start)`. The entity documents themselves are owned by a layer
  /// outside this crate; this call exists purely so rollback can undo
  /// whatever a client speculatively wrote under the commit's coordinates.
  fn delete_entities(&self, entity_kind: &str, query: &Query) -> Result<u64, StoreError>;

  /// Wipe every branch record. Destructive; backs `BranchCoordinator::delete_all`
  /// for tests and administrative resets.
  fn delete_all_branches(&self) -> Result<(), StoreError>;
}
