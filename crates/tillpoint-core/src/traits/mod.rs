//! Seam traits implemented by the store and transport crates.

pub mod store;
pub mod transport;

pub use store::{ICacheStore, IMutationQueue, ISessionStore};
pub use transport::ITransport;
