//! Error taxonomy for the sync layer.
//!
//! One sub-enum per concern, wrapped by [`TillpointError`]. Callers match on
//! the wrapper; components construct the sub-enums.

pub mod gateway_error;
pub mod storage_error;

pub use gateway_error::GatewayError;
pub use storage_error::StorageError;

/// Top-level error type for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum TillpointError {
    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    GatewayError(#[from] GatewayError),

    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used by every fallible API in the workspace.
pub type TillpointResult<T> = Result<T, TillpointError>;

impl TillpointError {
    /// True when the error is a transport-level failure (no response at all).
    /// The gateway's cache fallback and the replayer's retry classification
    /// both key off this.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TillpointError::GatewayError(GatewayError::Network { .. })
        )
    }

    /// True when the error is the hard re-authentication boundary (HTTP 401).
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            TillpointError::GatewayError(GatewayError::SessionExpired)
        )
    }
}
