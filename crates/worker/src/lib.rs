//! `jobpool-worker` library crate.
//!
//! Bulk record import built on `jobpool-core`. Re-exports internal modules
//! for integration testing; the binary entrypoint lives in `main.rs`.

pub mod config;
pub mod import;
pub mod record;
pub mod summary;
