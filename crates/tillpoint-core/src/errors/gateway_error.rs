/// Request gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("session expired")]
    SessionExpired,
}
