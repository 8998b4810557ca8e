//! Version-gated schema migrations.
//!
//! Gated on `PRAGMA user_version`. Opening a database whose on-disk version
//! is *newer* than the code's is not an error: no migration runs and the
//! higher version is left in place, so a rollback to an older build never
//! hits a fatal version mismatch.

pub mod v001_cache_tables;
pub mod v002_mutation_queue;
pub mod v003_session_slot;

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::routes::RouteTable;

use crate::to_storage_err;

/// Schema version this build expects.
pub const SCHEMA_VERSION: u32 = 3;

/// Bring the database up to [`SCHEMA_VERSION`]. Idempotent: every step uses
/// `CREATE TABLE IF NOT EXISTS`, and already-applied steps are skipped by
/// the version gate. Pre-existing tables and their data are left untouched.
pub fn run_migrations(conn: &Connection, routes: &RouteTable) -> TillpointResult<()> {
    let on_disk = current_version(conn)?;

    if on_disk > SCHEMA_VERSION {
        tracing::warn!(
            "store: on-disk schema v{on_disk} is newer than code v{SCHEMA_VERSION}, opening as-is"
        );
        return Ok(());
    }

    if on_disk < 1 {
        v001_cache_tables::migrate(conn, routes)?;
    }
    if on_disk < 2 {
        v002_mutation_queue::migrate(conn)?;
    }
    if on_disk < 3 {
        v003_session_slot::migrate(conn)?;
    }

    if on_disk < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| to_storage_err(e.to_string()))?;
        tracing::info!("store: schema migrated v{on_disk} -> v{SCHEMA_VERSION}");
    }

    Ok(())
}

/// Read the current `user_version`.
pub fn current_version(conn: &Connection) -> TillpointResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))
        .map_err(|e| to_storage_err(e.to_string()))
}
