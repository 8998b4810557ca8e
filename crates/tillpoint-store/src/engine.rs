//! LocalStore — owns the ConnectionPool, implements ICacheStore +
//! IMutationQueue + ISessionStore, runs migrations on open.

use std::path::Path;

use serde_json::Value;

use tillpoint_core::constants::SETTINGS_TABLE;
use tillpoint_core::errors::{StorageError, TillpointResult};
use tillpoint_core::models::{DeadMutation, PendingMutation, RequestRecord, Session};
use tillpoint_core::routes::{Route, RouteTable};
use tillpoint_core::traits::{ICacheStore, IMutationQueue, ISessionStore};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries;

/// The durable on-device store: entity cache tables, settings slot,
/// mutation queue, and session slot.
pub struct LocalStore {
    pool: ConnectionPool,
    routes: RouteTable,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
}

impl LocalStore {
    /// Open a store backed by a file on disk, with the default catalog.
    pub fn open(path: &Path) -> TillpointResult<Self> {
        Self::open_with_routes(path, RouteTable::retail_catalog())
    }

    /// Open a file-backed store with an explicit route catalog.
    pub fn open_with_routes(path: &Path, routes: RouteTable) -> TillpointResult<Self> {
        let pool = ConnectionPool::open(path, 2)?;
        let store = Self {
            pool,
            routes,
            use_read_pool: true,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing). Reads route through the
    /// writer since in-memory read pool connections are isolated databases.
    pub fn open_in_memory() -> TillpointResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let store = Self {
            pool,
            routes: RouteTable::retail_catalog(),
            use_read_pool: false,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| migrations::run_migrations(conn, &self.routes))
    }

    /// The route catalog this store was opened with.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn route(&self, table: &str) -> TillpointResult<&Route> {
        self.routes
            .route_for_table(table)
            .ok_or_else(|| {
                StorageError::UnknownTable {
                    table: table.to_string(),
                }
                .into()
            })
    }

    /// Execute a read-only query on the best available connection.
    fn with_reader<F, T>(&self, f: F) -> TillpointResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> TillpointResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }
}

impl ICacheStore for LocalStore {
    fn get_all(&self, table: &str) -> TillpointResult<Vec<Value>> {
        let route = self.route(table)?;
        self.with_reader(|conn| queries::cache_ops::get_all(conn, route))
    }

    fn get(&self, table: &str, key: &str) -> TillpointResult<Option<Value>> {
        let route = self.route(table)?;
        self.with_reader(|conn| queries::cache_ops::get(conn, route, key))
    }

    fn put(&self, table: &str, record: &Value) -> TillpointResult<()> {
        let route = self.route(table)?;
        self.pool
            .writer
            .with_conn_sync(|conn| queries::cache_ops::put(conn, route, record))
    }

    fn bulk_put(&self, table: &str, records: &[Value]) -> TillpointResult<()> {
        let route = self.route(table)?;
        self.pool
            .writer
            .with_conn_sync(|conn| queries::cache_ops::bulk_put(conn, route, records))
    }

    fn put_settings(&self, record: &Value) -> TillpointResult<()> {
        let route = self.route(SETTINGS_TABLE)?;
        self.pool
            .writer
            .with_conn_sync(|conn| queries::cache_ops::put(conn, route, record))
    }

    fn get_settings(&self) -> TillpointResult<Option<Value>> {
        let route = self.route(SETTINGS_TABLE)?;
        self.with_reader(|conn| queries::cache_ops::get_singleton(conn, route))
    }

    fn reset(&self) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::maintenance::reset(conn, &self.routes))
    }
}

impl IMutationQueue for LocalStore {
    fn enqueue_mutation(&self, endpoint: &str, request: &RequestRecord) -> TillpointResult<i64> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::queue_ops::enqueue(conn, endpoint, request))
    }

    fn queued_mutations(&self) -> TillpointResult<Vec<PendingMutation>> {
        // Queue reads go through the writer: a replay cycle interleaves
        // reads and deletes, and WAL readers may lag the writer.
        self.pool
            .writer
            .with_conn_sync(queries::queue_ops::list_pending)
    }

    fn remove_mutation(&self, id: i64) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::queue_ops::remove(conn, id))
    }

    fn record_attempt(&self, id: i64) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::queue_ops::record_attempt(conn, id))
    }

    fn dead_letter_mutation(&self, id: i64, reason: &str) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::queue_ops::dead_letter(conn, id, reason))
    }

    fn dead_mutations(&self) -> TillpointResult<Vec<DeadMutation>> {
        self.pool
            .writer
            .with_conn_sync(queries::queue_ops::list_dead)
    }

    fn discard_dead_mutation(&self, id: i64) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::queue_ops::discard_dead(conn, id))
    }

    fn pending_count(&self) -> TillpointResult<usize> {
        self.pool
            .writer
            .with_conn_sync(queries::queue_ops::pending_count)
    }
}

impl ISessionStore for LocalStore {
    fn store_session(&self, session: &Session) -> TillpointResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::session_ops::store(conn, session))
    }

    fn load_session(&self) -> TillpointResult<Option<Session>> {
        self.with_reader(queries::session_ops::load)
    }

    fn clear_session(&self) -> TillpointResult<()> {
        self.pool.writer.with_conn_sync(queries::session_ops::clear)
    }
}
