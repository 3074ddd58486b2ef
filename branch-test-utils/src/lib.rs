//! Test utilities shared across the branch-versioning workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A pre-wired in-memory store and coordinator ([`InMemoryStoreGuard`])
//! - Timespan-chain assertions ([`assert_timespan_contiguity`])
//!
//! The clippy dead_code lint is disabled for this crate because test
//! utilities may not be used by all tests, and the compiler cannot detect
//! usage across crate boundaries in development dependencies.

#![allow(clippy::dead_code)]

pub mod fixture;

pub use fixture::{InMemoryStoreGuard, assert_timespan_contiguity};
