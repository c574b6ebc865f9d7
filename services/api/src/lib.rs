//! services/api/src/lib.rs
//!
//! The api service library. The binaries in `src/bin/` wire these modules
//! together; everything here is also reachable from tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod extract;
pub mod web;
