//! Single-slot session persistence.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::models::Session;

use crate::to_storage_err;

pub fn store(conn: &Connection, session: &Session) -> TillpointResult<()> {
    let data = serde_json::to_string(session).map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO session (slot, data, stored_at) VALUES (0, ?1, ?2)
         ON CONFLICT(slot) DO UPDATE SET data = excluded.data, stored_at = excluded.stored_at",
        params![data, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn load(conn: &Connection) -> TillpointResult<Option<Session>> {
    let data: Option<String> = conn
        .query_row("SELECT data FROM session WHERE slot = 0", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    data.map(|d| {
        serde_json::from_str(&d).map_err(|e| to_storage_err(format!("corrupt session: {e}")))
    })
    .transpose()
}

pub fn clear(conn: &Connection) -> TillpointResult<()> {
    conn.execute("DELETE FROM session WHERE slot = 0", [])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
