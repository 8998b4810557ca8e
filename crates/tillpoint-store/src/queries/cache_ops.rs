//! Upsert, lookup, and bulk ops for entity cache tables.
//!
//! Table and key-field names come from the declared route catalog, never
//! from caller input, so they are formatted into SQL directly; record keys
//! and payloads always go through bound parameters.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use tillpoint_core::errors::{StorageError, TillpointResult};
use tillpoint_core::routes::{Route, RouteKey};

use crate::to_storage_err;

/// Every record in the table, in storage order.
pub fn get_all(conn: &Connection, route: &Route) -> TillpointResult<Vec<Value>> {
    let mut stmt = conn
        .prepare(&format!("SELECT data FROM {}", route.table))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let data = row.map_err(|e| to_storage_err(e.to_string()))?;
        records.push(parse_record(&data)?);
    }
    Ok(records)
}

/// Point lookup by key. For the singleton table the key is ignored and the
/// slot record is returned.
pub fn get(conn: &Connection, route: &Route, key: &str) -> TillpointResult<Option<Value>> {
    let sql = match route.key {
        RouteKey::Field(field) => {
            format!("SELECT data FROM {} WHERE {} = ?1", route.table, field)
        }
        RouteKey::Singleton => {
            return get_singleton(conn, route);
        }
    };

    let data: Option<String> = conn
        .query_row(&sql, params![key], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    data.map(|d| parse_record(&d)).transpose()
}

/// Upsert one record. Keyed tables take the key from the record's declared
/// key field; the singleton table writes its fixed slot.
pub fn put(conn: &Connection, route: &Route, record: &Value) -> TillpointResult<()> {
    match route.key {
        RouteKey::Field(_) => upsert_keyed(conn, route, record),
        RouteKey::Singleton => put_singleton(conn, route, record),
    }
}

/// Upsert many records in one transaction. No-op on empty input; atomic per
/// SQLite transaction semantics.
pub fn bulk_put(conn: &Connection, route: &Route, records: &[Value]) -> TillpointResult<()> {
    if records.is_empty() {
        return Ok(());
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("bulk_put begin: {e}")))?;

    let result = records.iter().try_for_each(|record| put(&tx, route, record));

    match result {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("bulk_put commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Read the singleton slot.
pub fn get_singleton(conn: &Connection, route: &Route) -> TillpointResult<Option<Value>> {
    let data: Option<String> = conn
        .query_row(
            &format!("SELECT data FROM {} WHERE slot = 0", route.table),
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    data.map(|d| parse_record(&d)).transpose()
}

fn upsert_keyed(conn: &Connection, route: &Route, record: &Value) -> TillpointResult<()> {
    let field = route.key_field().unwrap_or("id");
    let key = route
        .record_key(record)
        .ok_or_else(|| StorageError::MissingKey {
            table: route.table.to_string(),
            key_field: field.to_string(),
        })?;

    let data = serde_json::to_string(record).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        &format!(
            "INSERT INTO {table} ({field}, data, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT({field}) DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
            table = route.table,
            field = field,
        ),
        params![key, data, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn put_singleton(conn: &Connection, route: &Route, record: &Value) -> TillpointResult<()> {
    let data = serde_json::to_string(record).map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        &format!(
            "INSERT INTO {table} (slot, data, cached_at) VALUES (0, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
            table = route.table,
        ),
        params![data, Utc::now().to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn parse_record(data: &str) -> TillpointResult<Value> {
    serde_json::from_str(data).map_err(|e| to_storage_err(format!("corrupt cache record: {e}")))
}
