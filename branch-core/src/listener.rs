//! Pre-completion commit listeners.

use std::sync::Arc;

use crate::commit::Commit;
use crate::error::BranchError;

/// A hook invoked synchronously, in registration order, before any branch
/// record is written for a completing commit.
///
/// Listeners are trusted: a failure aborts completion (the commit does not
/// complete; the caller is responsible for rolling it back).
pub trait CommitListener: Send + Sync {
  fn pre_commit_completion(&self, commit: &Commit) -> Result<(), BranchError>;
}

/// An owned collection of listeners, deduplicated by identity rather than
/// equality — two distinct listener instances with identical behavior are
/// both kept; registering the same `Arc` twice is a no-op.
#[derive(Default)]
pub struct ListenerRegistry {
  listeners: Vec<Arc<dyn CommitListener>>,
}

impl ListenerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a listener unless an identical `Arc` is already registered.
  pub fn add(&mut self, listener: Arc<dyn CommitListener>) {
    if self.listeners.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
      return;
    }
    self.listeners.push(listener);
  }

  /// Run every registered listener in registration order, stopping at the
  /// first failure.
  pub fn fire(&self, commit: &Commit) -> Result<(), BranchError> {
    for listener in &self.listeners {
      listener.pre_commit_completion(commit)?;
    }
    Ok(())
  }
}
