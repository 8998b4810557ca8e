//! Request descriptions — the unit both the live path and the queue share.
//!
//! A queued mutation stores the full [`RequestRecord`] so it can be replayed
//! later; the live path builds the same record and sends it immediately.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP verb, split by read/mutate semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Everything except GET mutates server state and is queueable offline.
    pub fn is_mutation(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to issue (or re-issue) one server call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: HttpMethod,
    /// Endpoint path relative to the API base URL, e.g. `/products/p1/stock`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Extra headers captured at build time. The `Authorization` header is
    /// re-derived from the current session at send time, never replayed from
    /// here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

impl RequestRecord {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Raw reply from the transport: the HTTP status plus the decoded JSON body,
/// if the payload was JSON at all.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl TransportReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
