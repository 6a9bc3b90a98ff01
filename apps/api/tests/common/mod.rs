//! Shared setup for API integration tests
//!
//! Every test runs against a seeded [`MemoryStore`], so no database is
//! needed and the store journal can be used to count round trips.

#![allow(dead_code, unused_imports)]

pub mod fixtures;

pub use fixtures::*;
