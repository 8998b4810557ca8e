//! The persisted user session, including the bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current authenticated session. Stored in the session slot of the local
/// store; read by the gateway on every call; cleared on HTTP 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to every authorized request.
    pub token: String,
    /// Serialized user object as returned by the login endpoint.
    pub user: serde_json::Value,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: serde_json::Value) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at: Utc::now(),
        }
    }
}
