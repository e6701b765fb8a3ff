//! Common test utilities and fixtures for cscope-nav integration tests
//!
//! This module provides:
//! - `TestRepo` builder for creating C project trees with a fake indexer
//! - Custom assertions for validating CLI output

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod assertions;
pub mod test_repo;

pub use assertions::*;
pub use test_repo::TestRepo;
