//! v003: single-row session slot.

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> TillpointResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS session (
            slot       INTEGER PRIMARY KEY CHECK (slot = 0),
            data       TEXT NOT NULL,
            stored_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
