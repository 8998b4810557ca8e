//! v002: pending_mutations queue and dead_mutations side table.

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> TillpointResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pending_mutations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            endpoint    TEXT NOT NULL,
            request     TEXT NOT NULL,
            attempts    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_pending_created ON pending_mutations(created_at);

        CREATE TABLE IF NOT EXISTS dead_mutations (
            id          INTEGER PRIMARY KEY,
            endpoint    TEXT NOT NULL,
            request     TEXT NOT NULL,
            attempts    INTEGER NOT NULL DEFAULT 0,
            reason      TEXT NOT NULL,
            dead_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
