//! dialcache-core - Sync and classification engine for dialcache
//!
//! This crate keeps locally cached replicas of an externally-owned
//! contact directory and call-log history: id-based reconciliation
//! against the source, per-domain sync orchestration with conflated
//! change triggers, call-log classification for display, and
//! first-letter contact indexing.

pub mod classify;
pub mod db;
pub mod error;
pub mod index;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod source;
pub mod sync;

pub use error::{Error, Result};
pub use models::{CallLogRecord, CallType, ContactRecord, Record};
