// casanet-api: Async Rust client for the casanet hub REST API and timings feed

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod feed;
pub mod minions;
pub mod models;
pub mod timings;
pub mod transport;

pub use auth::LoginResponse;
pub use client::HubClient;
pub use error::Error;
pub use feed::{FeedHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};
