use serde_json::Value;

use crate::errors::TillpointResult;
use crate::models::{DeadMutation, PendingMutation, RequestRecord, Session};

/// Entity cache: per-table last-write-wins key/value persistence plus the
/// singleton settings slot.
pub trait ICacheStore: Send + Sync {
    // --- Reads ---
    /// Every record in the table, order unspecified. Empty vec for an empty
    /// table; unknown table names are an error.
    fn get_all(&self, table: &str) -> TillpointResult<Vec<Value>>;
    /// Point lookup; absence is `None`, not an error.
    fn get(&self, table: &str, key: &str) -> TillpointResult<Option<Value>>;

    // --- Writes ---
    /// Upsert one record, keyed by the table's declared key field.
    fn put(&self, table: &str, record: &Value) -> TillpointResult<()>;
    /// Upsert many records in one transaction. No-op on empty input.
    fn bulk_put(&self, table: &str, records: &[Value]) -> TillpointResult<()>;

    // --- Settings singleton ---
    fn put_settings(&self, record: &Value) -> TillpointResult<()>;
    fn get_settings(&self) -> TillpointResult<Option<Value>>;

    // --- Maintenance ---
    /// Whole-database reset: clears every cache table, both mutation queues,
    /// and the session slot. The only bulk deletion path.
    fn reset(&self) -> TillpointResult<()>;
}

/// The append-only pending-mutation queue plus its dead-letter side table.
pub trait IMutationQueue: Send + Sync {
    /// Append one mutation; returns the assigned monotonic id.
    fn enqueue_mutation(&self, endpoint: &str, request: &RequestRecord) -> TillpointResult<i64>;
    /// All queued mutations in insertion (= replay) order.
    fn queued_mutations(&self) -> TillpointResult<Vec<PendingMutation>>;
    /// Delete one mutation after successful replay. Missing id is a no-op.
    fn remove_mutation(&self, id: i64) -> TillpointResult<()>;
    /// Increment the attempt count after a retriable replay failure.
    fn record_attempt(&self, id: i64) -> TillpointResult<()>;
    /// Move a mutation to the dead-letter table after a terminal failure.
    fn dead_letter_mutation(&self, id: i64, reason: &str) -> TillpointResult<()>;
    /// All dead-lettered mutations, oldest first.
    fn dead_mutations(&self) -> TillpointResult<Vec<DeadMutation>>;
    /// Permanently discard one dead-lettered mutation.
    fn discard_dead_mutation(&self, id: i64) -> TillpointResult<()>;
    /// Number of mutations currently awaiting replay.
    fn pending_count(&self) -> TillpointResult<usize>;
}

/// Single-slot persistence for the current session.
pub trait ISessionStore: Send + Sync {
    fn store_session(&self, session: &Session) -> TillpointResult<()>;
    fn load_session(&self) -> TillpointResult<Option<Session>>;
    fn clear_session(&self) -> TillpointResult<()>;
}
