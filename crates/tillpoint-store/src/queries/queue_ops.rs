//! Pending-mutation queue and dead-letter operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::models::{DeadMutation, PendingMutation, RequestRecord};

use crate::to_storage_err;

/// Append one mutation; returns the assigned AUTOINCREMENT id. Ids are
/// strictly increasing, so id order is enqueue order is replay order.
pub fn enqueue(
    conn: &Connection,
    endpoint: &str,
    request: &RequestRecord,
) -> TillpointResult<i64> {
    let request_json =
        serde_json::to_string(request).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO pending_mutations (endpoint, request, attempts, created_at)
         VALUES (?1, ?2, 0, ?3)",
        params![endpoint, request_json, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}

/// All queued mutations in insertion order.
pub fn list_pending(conn: &Connection) -> TillpointResult<Vec<PendingMutation>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, endpoint, request, attempts, created_at
             FROM pending_mutations ORDER BY id ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], row_to_pending)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut mutations = Vec::new();
    for row in rows {
        mutations.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(mutations)
}

/// Delete one queued mutation. Deleting a missing id is a no-op.
pub fn remove(conn: &Connection, id: i64) -> TillpointResult<()> {
    conn.execute("DELETE FROM pending_mutations WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Increment the attempt counter after a retriable replay failure.
pub fn record_attempt(conn: &Connection, id: i64) -> TillpointResult<()> {
    conn.execute(
        "UPDATE pending_mutations SET attempts = attempts + 1 WHERE id = ?1",
        params![id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Move one mutation from the pending queue to the dead-letter table,
/// preserving its id, in a single transaction.
pub fn dead_letter(conn: &Connection, id: i64, reason: &str) -> TillpointResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("dead_letter begin: {e}")))?;

    tx.execute(
        "INSERT INTO dead_mutations (id, endpoint, request, attempts, reason, dead_at)
         SELECT id, endpoint, request, attempts, ?2, ?3
         FROM pending_mutations WHERE id = ?1",
        params![id, reason, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    tx.execute("DELETE FROM pending_mutations WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("dead_letter commit: {e}")))?;
    Ok(())
}

/// All dead-lettered mutations, oldest first.
pub fn list_dead(conn: &Connection) -> TillpointResult<Vec<DeadMutation>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, endpoint, request, attempts, reason, dead_at
             FROM dead_mutations ORDER BY id ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], row_to_dead)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut mutations = Vec::new();
    for row in rows {
        mutations.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(mutations)
}

/// Permanently discard one dead-lettered mutation.
pub fn discard_dead(conn: &Connection, id: i64) -> TillpointResult<()> {
    conn.execute("DELETE FROM dead_mutations WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Number of mutations awaiting replay.
pub fn pending_count(conn: &Connection) -> TillpointResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pending_mutations", [], |row| {
            row.get(0)
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

fn row_to_pending(row: &Row<'_>) -> rusqlite::Result<TillpointResult<PendingMutation>> {
    let id: i64 = row.get(0)?;
    let endpoint: String = row.get(1)?;
    let request_json: String = row.get(2)?;
    let attempts: u32 = row.get(3)?;
    let created_at: String = row.get(4)?;

    Ok(build_pending(id, endpoint, &request_json, attempts, &created_at))
}

fn build_pending(
    id: i64,
    endpoint: String,
    request_json: &str,
    attempts: u32,
    created_at: &str,
) -> TillpointResult<PendingMutation> {
    let request: RequestRecord = serde_json::from_str(request_json)
        .map_err(|e| to_storage_err(format!("corrupt queued request {id}: {e}")))?;
    Ok(PendingMutation {
        id,
        endpoint,
        request,
        attempts,
        created_at: parse_timestamp(created_at),
    })
}

fn row_to_dead(row: &Row<'_>) -> rusqlite::Result<TillpointResult<DeadMutation>> {
    let id: i64 = row.get(0)?;
    let endpoint: String = row.get(1)?;
    let request_json: String = row.get(2)?;
    let attempts: u32 = row.get(3)?;
    let reason: String = row.get(4)?;
    let dead_at: String = row.get(5)?;

    Ok(build_dead(id, endpoint, &request_json, attempts, reason, &dead_at))
}

fn build_dead(
    id: i64,
    endpoint: String,
    request_json: &str,
    attempts: u32,
    reason: String,
    dead_at: &str,
) -> TillpointResult<DeadMutation> {
    let request: RequestRecord = serde_json::from_str(request_json)
        .map_err(|e| to_storage_err(format!("corrupt dead request {id}: {e}")))?;
    Ok(DeadMutation {
        id,
        endpoint,
        request,
        attempts,
        reason,
        dead_at: parse_timestamp(dead_at),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}
