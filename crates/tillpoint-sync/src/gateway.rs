//! Request gateway — the single chokepoint for all server communication.
//!
//! Every call site gets the same policy: mutations attempted while offline
//! are queued (never sent against a known-down network), reads degrade
//! transparently to the local cache on transport failure, and a 401 clears
//! the stored session. Centralizing this here means no page or component
//! re-implements queue-or-fallback logic.

use std::sync::Arc;

use serde_json::Value;

use tillpoint_core::constants::AUTHORIZATION_HEADER;
use tillpoint_core::errors::{GatewayError, TillpointResult};
use tillpoint_core::models::{HttpMethod, RequestRecord, TransportReply};
use tillpoint_core::routes::{RouteKey, RouteTable};
use tillpoint_core::traits::{ICacheStore, IMutationQueue, ISessionStore, ITransport};
use tillpoint_store::LocalStore;

/// Outcome of a gateway call.
///
/// `offline` distinguishes a mutation that was queued for later replay from
/// a completed call — callers surface it as "queued", not "failed". Reads
/// served from the cache are deliberately indistinguishable from live ones.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub offline: bool,
    pub data: Option<Value>,
}

impl GatewayReply {
    /// An accepted-offline marker: the mutation is queued, no payload.
    pub fn queued() -> Self {
        Self {
            offline: true,
            data: None,
        }
    }

    /// A completed call, with or without a payload.
    pub fn live(data: Option<Value>) -> Self {
        Self {
            offline: false,
            data,
        }
    }
}

/// The chokepoint component deciding network-vs-queue-vs-cache per call.
pub struct RequestGateway<T: ITransport> {
    transport: T,
    store: Arc<LocalStore>,
    connectivity: crate::ConnectivityState,
    routes: RouteTable,
}

impl<T: ITransport> RequestGateway<T> {
    pub fn new(
        transport: T,
        store: Arc<LocalStore>,
        connectivity: crate::ConnectivityState,
    ) -> Self {
        let routes = store.routes().clone();
        Self {
            transport,
            store,
            connectivity,
            routes,
        }
    }

    /// The route catalog the gateway resolves fallbacks against.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Execute one server call under the offline policy.
    pub fn execute(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> TillpointResult<GatewayReply> {
        let mut request = RequestRecord::new(method, endpoint)
            .with_header("X-Request-Id", uuid::Uuid::new_v4().to_string());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        // Mutations never touch a known-down network: queue first, before
        // any send attempt.
        if method.is_mutation() && !self.connectivity.is_online() {
            let id = self.store.enqueue_mutation(endpoint, &request)?;
            tracing::info!("gateway: offline, queued {method} {endpoint} as mutation {id}");
            return Ok(GatewayReply::queued());
        }

        match self.send_authorized(&request) {
            Ok(reply) if reply.is_success() => Ok(GatewayReply::live(reply.body)),
            Ok(reply) => Err(http_error(&reply).into()),
            Err(e) if e.is_network() && !method.is_mutation() => {
                self.cache_fallback(endpoint, e)
            }
            Err(e) => Err(e),
        }
    }

    /// Send a request with a freshly derived `Authorization` header.
    ///
    /// Shared by the live path and the replayer: any stale auth header
    /// captured at enqueue time is dropped and replaced with the current
    /// session's token. A 401 clears the stored session before surfacing.
    pub fn send_authorized(&self, request: &RequestRecord) -> TillpointResult<TransportReply> {
        let mut outgoing = request.clone();
        outgoing
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        if let Some(session) = self.store.load_session()? {
            outgoing.headers.push((
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", session.token),
            ));
        }

        let reply = self.transport.send(&outgoing)?;

        if reply.status == 401 {
            tracing::warn!("gateway: 401 on {}, clearing session", request.path);
            self.store.clear_session()?;
            return Err(GatewayError::SessionExpired.into());
        }

        Ok(reply)
    }

    /// Serve a failed read from the local cache, resolved through the
    /// declared route table. A miss (or an unrouted endpoint) propagates the
    /// original transport error unchanged.
    fn cache_fallback(
        &self,
        endpoint: &str,
        original: tillpoint_core::TillpointError,
    ) -> TillpointResult<GatewayReply> {
        let Some(route) = self.routes.resolve(endpoint) else {
            return Err(original);
        };

        let cached = match route.key {
            RouteKey::Singleton => self.store.get_settings()?,
            RouteKey::Field(_) => match self.routes.endpoint_key(route, endpoint) {
                Some(key) => self.store.get(route.table, key)?,
                // Whole-table read: the table always exists once the schema
                // is initialized, so an empty table is an empty result, not
                // a miss.
                None => Some(Value::Array(self.store.get_all(route.table)?)),
            },
        };

        match cached {
            Some(value) => {
                tracing::info!("gateway: transport down, served {endpoint} from cache");
                Ok(GatewayReply::live(Some(value)))
            }
            None => Err(original),
        }
    }
}

/// Build the error for a non-2xx reply: the server's `{message}` body when
/// it decodes, else the canonical status text.
pub(crate) fn http_error(reply: &TransportReply) -> GatewayError {
    let message = reply
        .body
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| status_text(reply.status).to_string());
    GatewayError::Http {
        status: reply.status,
        message,
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Request Failed",
    }
}
