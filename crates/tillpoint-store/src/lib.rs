//! # tillpoint-store
//!
//! SQLite persistence for the offline-first sync layer: one cache table per
//! entity type, the singleton settings slot, the pending-mutation queue with
//! its dead-letter side table, and the session slot. Survives restarts; all
//! schema setup is version-gated and idempotent.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::LocalStore;

use tillpoint_core::errors::{StorageError, TillpointError};

/// Wrap a rusqlite error message in the workspace error type.
pub(crate) fn to_storage_err(message: String) -> TillpointError {
    StorageError::SqliteError { message }.into()
}
