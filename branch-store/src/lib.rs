//! A concrete, in-memory [`branch_core::store::BranchStore`] implementation
//! with optional JSON-snapshot persistence. Used by the CLI, by
//! `branch-test-utils`, and by anything embedding `branch-core` without a
//! real backing document store.

pub mod memory;

pub use memory::InMemoryBranchStore;
