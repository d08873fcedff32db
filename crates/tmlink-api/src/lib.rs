// tmlink-api: Async Rust client for the tournament manager field set API (REST + WebSocket)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use auth::{AccessToken, ClientCredentials, DEFAULT_TOKEN_URL};
pub use client::{ClientConfig, TmClient};
pub use error::Error;
pub use transport::TransportConfig;
pub use websocket::{FieldsetSocket, SharedFieldsetState, SocketEvent};
