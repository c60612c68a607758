//! # gemlock-core
//!
//! The edit-lock kernel for the gem balance editor. Grants a single
//! authenticated user exclusive, time-bounded editing rights over a
//! named resource, survives process restarts through a pluggable store,
//! and expires locks lazily without a background scheduler.

pub mod expiry;
pub mod manager;
pub mod store;
#[path = "store_file.rs"]
pub mod store_file;
#[path = "store_memory.rs"]
pub mod store_memory;
pub mod types;

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
