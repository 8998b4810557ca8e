//! v001: one cache table per catalog route, plus the settings singleton.

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::routes::{RouteKey, RouteTable};

use crate::to_storage_err;

pub fn migrate(conn: &Connection, routes: &RouteTable) -> TillpointResult<()> {
    for route in routes.iter() {
        match route.key {
            RouteKey::Field(key_field) => {
                // Table and key names come from the static catalog, never
                // from caller input, so formatting them into DDL is safe.
                conn.execute_batch(&format!(
                    "
                    CREATE TABLE IF NOT EXISTS {table} (
                        {key}      TEXT PRIMARY KEY,
                        data       TEXT NOT NULL,
                        cached_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                    );
                    ",
                    table = route.table,
                    key = key_field,
                ))
                .map_err(|e| to_storage_err(e.to_string()))?;
            }
            RouteKey::Singleton => {
                conn.execute_batch(&format!(
                    "
                    CREATE TABLE IF NOT EXISTS {table} (
                        slot       INTEGER PRIMARY KEY CHECK (slot = 0),
                        data       TEXT NOT NULL,
                        cached_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                    );
                    ",
                    table = route.table,
                ))
                .map_err(|e| to_storage_err(e.to_string()))?;
            }
        }
    }
    Ok(())
}
