//! Whole-store maintenance.

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::routes::RouteTable;

use crate::to_storage_err;

/// Clear every cache table, both mutation queues, and the session slot in
/// one transaction. The schema itself is left in place.
pub fn reset(conn: &Connection, routes: &RouteTable) -> TillpointResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("reset begin: {e}")))?;

    for route in routes.iter() {
        tx.execute(&format!("DELETE FROM {}", route.table), [])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    for table in ["pending_mutations", "dead_mutations", "session"] {
        tx.execute(&format!("DELETE FROM {table}"), [])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("reset commit: {e}")))?;
    tracing::info!("store: reset complete");
    Ok(())
}
