use crate::errors::TillpointResult;
use crate::models::{RequestRecord, TransportReply};

/// Low-level request mechanism beneath the gateway.
///
/// Implementations return `Ok` for any response that reached the client,
/// whatever the status; `Err(GatewayError::Network)` is reserved for
/// transport-level failures where no response arrived at all. The gateway
/// owns all policy above that line (401 handling, error-body extraction,
/// cache fallback).
pub trait ITransport: Send + Sync {
    fn send(&self, request: &RequestRecord) -> TillpointResult<TransportReply>;
}
