// Async HTTP client for the tournament manager field set API.
//
// Base path: /api/
// Auth: `Authorization: Bearer <token>` + `x-tm-api-key` on every request,
// including the WebSocket upgrade.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::ClientRequestBuilder;
use tokio_tungstenite::tungstenite::http::Uri;
use tracing::debug;
use url::Url;

use crate::auth::{ClientCredentials, request_token};
use crate::error::Error;
use crate::models::{FieldInfo, FieldList, FieldsetAction, FieldsetInfo, FieldsetList};
use crate::transport::TransportConfig;
use crate::websocket::{FieldsetSocket, SharedFieldsetState, SocketEvent};

const API_KEY_HEADER: &str = "x-tm-api-key";

/// Everything needed to authenticate against one controller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller root, e.g. `http://192.168.1.50`.
    pub address: Url,
    pub api_key: SecretString,
    pub credentials: ClientCredentials,
    /// OAuth token endpoint.
    pub token_url: Url,
}

// ── Client ───────────────────────────────────────────────────────────

/// Authenticated client for one tournament manager controller.
///
/// Built by [`connect`](Self::connect), which performs the token exchange.
/// All endpoint methods return the unwrapped payloads.
#[derive(Debug, Clone)]
pub struct TmClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    token: SecretString,
}

impl TmClient {
    /// Exchange the client credentials for a token and build the client.
    pub async fn connect(config: &ClientConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let bare = transport.build_client()?;
        let token = request_token(&bare, &config.token_url, &config.credentials).await?;

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.token.expose_secret()))
            .map_err(|_| Error::InvalidHeader {
                header: "authorization",
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut key = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
            Error::InvalidHeader {
                header: API_KEY_HEADER,
            }
        })?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(&config.address)?;

        debug!(base_url = %base_url, "controller client ready");
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            token: token.token,
        })
    }

    /// The controller API root (always ends with `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/fieldsets`
    pub async fn list_fieldsets(&self) -> Result<Vec<FieldsetInfo>, Error> {
        let list: FieldsetList = self.get("fieldsets").await?;
        Ok(list.field_sets)
    }

    /// `GET /api/fieldsets/{id}/fields`
    pub async fn fieldset_fields(&self, fieldset_id: u32) -> Result<Vec<FieldInfo>, Error> {
        let list: FieldList = self.get(&format!("fieldsets/{fieldset_id}/fields")).await?;
        Ok(list.fields)
    }

    /// `POST /api/fieldsets/{id}/actions`
    pub async fn fieldset_action(
        &self,
        fieldset_id: u32,
        action: &FieldsetAction,
    ) -> Result<(), Error> {
        let url = self.url(&format!("fieldsets/{fieldset_id}/actions"))?;
        debug!(?action, "POST {url}");

        let resp = self.http.post(url).json(action).send().await?;
        check_status(resp).await.map(drop)
    }

    /// Open the field set WebSocket and start forwarding events to `events`.
    ///
    /// The socket folds into `state`, so passing the same handle on every
    /// reconnect keeps what earlier sockets learned.
    pub async fn open_fieldset_socket(
        &self,
        fieldset_id: u32,
        state: SharedFieldsetState,
        events: mpsc::Sender<SocketEvent>,
    ) -> Result<FieldsetSocket, Error> {
        let ws_url = self.socket_url(fieldset_id)?;
        debug!(url = %ws_url, "opening field set WebSocket");

        let uri: Uri = ws_url
            .as_str()
            .parse()
            .map_err(|e: tokio_tungstenite::tungstenite::http::uri::InvalidUri| {
                Error::WebSocketConnect(e.to_string())
            })?;
        let request = ClientRequestBuilder::new(uri)
            .with_header(
                AUTHORIZATION.as_str(),
                format!("Bearer {}", self.token.expose_secret()),
            )
            .with_header(API_KEY_HEADER, self.api_key.expose_secret());

        FieldsetSocket::open(request, state, events).await
    }

    /// WebSocket URL for a field set: same host, `ws`/`wss` scheme.
    pub fn socket_url(&self, fieldset_id: u32) -> Result<Url, Error> {
        let mut url = self.url(&format!("fieldsets/{fieldset_id}"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body = check_status(resp).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Turn non-success responses into [`Error::Api`], returning the body text otherwise.
async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        })
    }
}

/// Append `/api/` to the controller root unless it is already there.
fn normalize_base_url(address: &Url) -> Result<Url, Error> {
    let mut url = address.clone();
    let path = url.path().trim_end_matches('/').to_owned();

    if path.ends_with("/api") {
        url.set_path(&format!("{path}/"));
    } else {
        url.set_path(&format!("{path}/api/"));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_api_prefix() {
        let root = Url::parse("http://192.168.1.50").unwrap();
        assert_eq!(
            normalize_base_url(&root).unwrap().as_str(),
            "http://192.168.1.50/api/"
        );

        let already = Url::parse("http://tm.local:8080/api/").unwrap();
        assert_eq!(
            normalize_base_url(&already).unwrap().as_str(),
            "http://tm.local:8080/api/"
        );
    }
}
