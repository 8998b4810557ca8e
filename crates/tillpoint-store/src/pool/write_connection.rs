//! The single write connection, serialized behind a mutex.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;

use crate::to_storage_err;

use super::pragmas::apply_pragmas;

/// All writes in the store go through this one connection, so SQLite never
/// sees two concurrent writers.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> TillpointResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> TillpointResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a closure against the write connection while holding the lock.
    pub fn with_conn_sync<F, T>(&self, f: F) -> TillpointResult<T>
    where
        F: FnOnce(&Connection) -> TillpointResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("write connection mutex poisoned".to_string()))?;
        f(&guard)
    }
}
