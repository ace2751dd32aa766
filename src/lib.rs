//! NewsVault - daily news database synchronization
//!
//! Synchronizes per-day SQLite news files between a local data directory
//! and an S3-compatible object store. Every daily file is keyed by its
//! calendar date: `{date}.db` locally, `news/{date}.db` in the bucket.
//!
//! Pull installs remote dates that are missing locally and never touches
//! an existing local file; reconciliation happens on the upload side,
//! where the local file is merged into the current remote copy (upsert
//! by URL) before being written back.
//!
//! # Modules
//!
//! - `config`: configuration loading and remote credential resolution
//! - `data`: per-day SQLite files and the merge contract
//! - `date`: calendar date keys and the object key convention
//! - `error`: error types
//! - `service`: operation entry points (pull, push, status, listing)
//! - `storage`: object store backend, local store, sync engine

pub mod config;
pub mod data;
pub mod date;
pub mod error;
pub mod service;
pub mod storage;
