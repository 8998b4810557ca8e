//! Queued mutations — deferred server calls awaiting replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::RequestRecord;

/// One deferred server call in the pending queue.
///
/// The `id` is assigned by the store on insert (AUTOINCREMENT) and is the
/// replay order: strictly increasing, FIFO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: i64,
    /// The logical endpoint, preserved verbatim from enqueue time.
    pub endpoint: String,
    /// The full request description needed to replay the call.
    pub request: RequestRecord,
    /// How many replay attempts have failed so far.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

/// A mutation demoted out of the pending queue after a terminal failure.
/// Kept for inspection; never replayed automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadMutation {
    pub id: i64,
    pub endpoint: String,
    pub request: RequestRecord,
    pub attempts: u32,
    /// Human-readable failure reason recorded at demotion time.
    pub reason: String,
    pub dead_at: DateTime<Utc>,
}
