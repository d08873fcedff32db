use thiserror::Error;

/// Top-level error type for the `tmlink-api` crate.
///
/// Covers every failure mode of the controller surfaces: token exchange,
/// HTTP transport, the REST endpoints, and the field set WebSocket.
/// `tmlink-core` maps these into session-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange rejected (bad client id/secret, revoked client, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The configured client credentials are past their expiration date.
    #[error("Client credentials expired at {expired_at}")]
    CredentialsExpired { expired_at: String },

    /// A header value (API key or token) could not be encoded.
    #[error("Invalid header value for {header}")]
    InvalidHeader { header: &'static str },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── REST API ────────────────────────────────────────────────────
    /// Non-success response from a controller endpoint.
    #[error("Controller API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket handshake or read failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
