//! Round-robin pool of read connections.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use tillpoint_core::errors::TillpointResult;

use crate::to_storage_err;

use super::pragmas::apply_pragmas;

/// Read-only connections handed out round-robin. With WAL active, readers
/// never block the writer and vice versa.
pub struct ReadPool {
    conns: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, size: usize) -> TillpointResult<Self> {
        let mut conns = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
            apply_pragmas(&conn)?;
            conns.push(Mutex::new(conn));
        }
        Ok(Self {
            conns,
            next: AtomicUsize::new(0),
        })
    }

    pub fn open_in_memory(size: usize) -> TillpointResult<Self> {
        let mut conns = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
            apply_pragmas(&conn)?;
            conns.push(Mutex::new(conn));
        }
        Ok(Self {
            conns,
            next: AtomicUsize::new(0),
        })
    }

    /// Run a closure against the next read connection in rotation.
    pub fn with_conn<F, T>(&self, f: F) -> TillpointResult<T>
    where
        F: FnOnce(&Connection) -> TillpointResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        let guard = self.conns[idx]
            .lock()
            .map_err(|_| to_storage_err("read connection mutex poisoned".to_string()))?;
        f(&guard)
    }
}
