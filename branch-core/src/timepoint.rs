//! Time and identity primitives shared across the timespan model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single instant on the branch's timeline.
///
/// Wraps `chrono::DateTime<Utc>` rather than re-deriving timestamp math;
/// timespans compare and order `Timepoint`s directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timepoint(DateTime<Utc>);

impl Timepoint {
  /// The current instant.
  pub fn now() -> Self {
    Self(Utc::now())
  }

  /// Wrap an existing `DateTime<Utc>`.
  pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
    Self(dt)
  }

  /// Borrow the underlying `DateTime<Utc>`.
  pub const fn as_datetime(&self) -> &DateTime<Utc> {
    &self.0
  }

  /// A timepoint that sorts before every real timestamp; used as the open
  /// start of the first timespan on a freshly created branch.
  pub fn epoch() -> Self {
    Self(DateTime::<Utc>::MIN_UTC)
  }

  /// A timepoint that sorts after every real timestamp; marks an
  /// open-ended (current) timespan.
  pub fn far_future() -> Self {
    Self(DateTime::<Utc>::MAX_UTC)
  }

  /// True when this timepoint is the open-ended sentinel.
  pub fn is_open_ended(&self) -> bool {
    self.0 == DateTime::<Utc>::MAX_UTC
  }
}

impl fmt::Display for Timepoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.to_rfc3339())
  }
}

impl From<DateTime<Utc>> for Timepoint {
  fn from(dt: DateTime<Utc>) -> Self {
    Self(dt)
  }
}

/// Identifier of one version of one entity document, as recorded against a
/// branch's timespan. The entity document itself is owned by a layer
/// outside this crate; `branch-core` only ever carries its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityVersionId(Uuid);

impl EntityVersionId {
  /// Generate a fresh random id.
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }

  /// Wrap an existing id, e.g. one deserialized from the store.
  pub const fn from_uuid(id: Uuid) -> Self {
    Self(id)
  }

  /// Borrow the underlying UUID.
  pub const fn as_uuid(&self) -> &Uuid {
    &self.0
  }
}

impl Default for EntityVersionId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for EntityVersionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn epoch_orders_before_now() {
    assert!(Timepoint::epoch() < Timepoint::now());
  }

  #[test]
  fn far_future_is_open_ended() {
    assert!(Timepoint::far_future().is_open_ended());
    assert!(!Timepoint::now().is_open_ended());
  }

  #[test]
  fn entity_version_ids_are_unique() {
    assert_ne!(EntityVersionId::new(), EntityVersionId::new());
  }
}
