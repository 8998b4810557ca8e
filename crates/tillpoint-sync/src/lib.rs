//! # tillpoint-sync
//!
//! The offline-first sync layer over the local store: a connectivity
//! monitor, the request gateway every server call goes through, the
//! replayer that drains queued mutations on reconnect, optimistic
//! projections, and the controller that ties them together.

pub mod connectivity;
pub mod controller;
pub mod gateway;
pub mod optimistic;
pub mod replay;
pub mod transport;

pub use connectivity::ConnectivityState;
pub use controller::{LoadReport, SubmitOutcome, SyncController};
pub use gateway::{GatewayReply, RequestGateway};
pub use optimistic::ProjectionRegistry;
pub use replay::{ReplayReport, Replayer};
pub use transport::HttpTransport;
