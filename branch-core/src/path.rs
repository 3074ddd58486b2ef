//! Branch path domain type: a slash-delimited name identifying a branch in
//! the hierarchical namespace, rooted at the literal `MAIN`.
//!
//! Path operations are pure and never touch the store.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BranchError;

/// Literal name of the root branch.
pub const ROOT: &str = "MAIN";

/// A validated, slash-delimited branch path.
///
/// Wraps an `Arc<str>` so clones stay cheap as paths are threaded through
/// queries, commits, and lock tables.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchPath(Arc<str>);

impl BranchPath {
  /// Validate and construct a branch path.
  ///
  /// Rejects empty strings and any path containing `_`, per the data model
  /// invariant that `_` is reserved.
  pub fn new(path: impl Into<Arc<str>>) -> Result<Self, BranchError> {
    let path: Arc<str> = path.into();
    if path.is_empty() {
      return Err(BranchError::InvalidArgument("branch path must not be empty".into()));
    }
    if path.contains('_') {
      return Err(BranchError::InvalidArgument(format!(
        "branch path '{path}' must not contain '_'"
      )));
    }
    Ok(Self(path))
  }

  /// The root path, `MAIN`.
  pub fn root() -> Self {
    // Safe: ROOT is non-empty and contains no `_`.
    Self(Arc::from(ROOT))
  }

  /// Borrow the underlying path as a `&str`.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// True exactly when this path is the literal root `MAIN`.
  pub fn is_root(&self) -> bool {
    self.0.as_ref() == ROOT
  }

  /// The path one level up, or `None` if this path is the root.
  pub fn parent(&self) -> Option<BranchPath> {
    if self.is_root() {
      return None;
    }
    match self.0.rfind('/') {
      Some(idx) => Self::new(&self.0[..idx]).ok(),
      None => Some(BranchPath::root()),
    }
  }

  /// True when `self` is a strict ancestor of `other` (i.e. `other` begins
  /// with `self` followed by `/`).
  pub fn is_ancestor_of(&self, other: &BranchPath) -> bool {
    let prefix = format!("{}/", self.0);
    other.0.starts_with(&prefix)
  }

  /// Number of `/`-delimited segments in this path.
  pub fn segment_count(&self) -> usize {
    self.0.split('/').count()
  }

  /// Append a child segment, producing `self/child`.
  pub fn child(&self, segment: &str) -> Result<BranchPath, BranchError> {
    BranchPath::new(format!("{}/{}", self.0, segment))
  }
}

impl fmt::Debug for BranchPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("BranchPath").field(&self.as_str()).finish()
  }
}

impl fmt::Display for BranchPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<String> for BranchPath {
  type Error = BranchError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    BranchPath::new(value)
  }
}

impl TryFrom<&str> for BranchPath {
  type Error = BranchError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    BranchPath::new(value)
  }
}

impl From<BranchPath> for String {
  fn from(value: BranchPath) -> Self {
    value.0.to_string()
  }
}
