// OAuth client-credentials token exchange.
//
// The controller's REST and WebSocket surfaces require a bearer token
// obtained from the vendor authorization server. Tokens are requested once
// per client; refresh is left to reconnecting with a new client.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Default authorization server for tournament manager API clients.
pub const DEFAULT_TOKEN_URL: &str = "https://auth.vextm.dwabtech.com/oauth2/token";

/// OAuth client credentials issued for a tournament manager API client.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    /// The date after which the authorization server rejects this client.
    pub expires_at: DateTime<Utc>,
}

impl ClientCredentials {
    /// Returns `true` if the credentials are past their expiration at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A bearer token returned by the authorization server.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretString,
    /// Lifetime reported by the server, in seconds.
    pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchange client credentials for a bearer token.
///
/// Expired credentials are rejected locally without a network call.
pub async fn request_token(
    http: &reqwest::Client,
    token_url: &Url,
    credentials: &ClientCredentials,
) -> Result<AccessToken, Error> {
    if credentials.is_expired_at(Utc::now()) {
        return Err(Error::CredentialsExpired {
            expired_at: credentials.expires_at.to_rfc3339(),
        });
    }

    debug!(url = %token_url, client_id = %credentials.client_id, "requesting access token");

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.expose_secret()),
    ];

    let resp = http.post(token_url.clone()).form(&form).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("token request failed (HTTP {status}): {body}"),
        });
    }

    let body = resp.text().await?;
    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

    debug!(expires_in = ?parsed.expires_in, "access token granted");
    Ok(AccessToken {
        token: SecretString::from(parsed.access_token),
        expires_in: parsed.expires_in,
    })
}
