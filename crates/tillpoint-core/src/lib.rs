//! # tillpoint-core
//!
//! Foundation crate for the Tillpoint offline-first sync layer.
//! Defines all types, traits, errors, routes, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod routes;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::SyncConfig;
pub use errors::{GatewayError, StorageError, TillpointError, TillpointResult};
pub use models::{
    DeadMutation, HttpMethod, PendingMutation, RequestRecord, Session, TransportReply,
};
pub use routes::{Route, RouteKey, RouteTable};
