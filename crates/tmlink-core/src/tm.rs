// ── Tournament manager adapter ──
//
// Implements the controller client seam on top of `tmlink-api`. Each
// subscription is a field set WebSocket plus a bridge task that converts
// socket events into `ResourceEvent`s for the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use url::Url;

use tmlink_api::models::FieldsetAction;
use tmlink_api::{
    ClientConfig, ClientCredentials, FieldsetSocket, SharedFieldsetState, SocketEvent, TmClient,
    TransportConfig,
};

use crate::command::FieldSetCommand;
use crate::config::Credentials;
use crate::error::CoreError;
use crate::model::Field;
use crate::session::client::{ControllerClient, ControllerSession, FieldSetResource, ResourceEvent};

pub use tmlink_api::DEFAULT_TOKEN_URL;

const SOCKET_CHANNEL_SIZE: usize = 64;

/// Connects to tournament manager controllers over HTTP and WebSocket.
#[derive(Debug, Clone)]
pub struct TmController {
    transport: TransportConfig,
    token_url: Url,
}

impl TmController {
    /// `timeout` applies to every HTTP request; `token_url` is the OAuth
    /// endpoint that issues access tokens.
    pub fn new(timeout: Duration, token_url: Url) -> Self {
        Self {
            transport: TransportConfig { timeout },
            token_url,
        }
    }

    /// Default transport settings against the public token endpoint.
    pub fn with_defaults() -> Result<Self, CoreError> {
        let token_url = Url::parse(DEFAULT_TOKEN_URL).map_err(|e| CoreError::Config {
            message: format!("invalid token URL: {e}"),
        })?;
        Ok(Self {
            transport: TransportConfig::default(),
            token_url,
        })
    }
}

impl ControllerClient for TmController {
    type Session = TmSession;

    async fn authenticate(&self, credentials: &Credentials) -> Result<TmSession, CoreError> {
        let config = ClientConfig {
            address: credentials.address.clone(),
            api_key: credentials.api_key.clone(),
            credentials: ClientCredentials {
                client_id: credentials.client_id.clone(),
                client_secret: credentials.client_secret.clone(),
                expires_at: credentials.expires_at,
            },
            token_url: self.token_url.clone(),
        };

        let client = TmClient::connect(&config, &self.transport).await?;
        Ok(TmSession {
            client: Arc::new(client),
        })
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// An authenticated controller connection.
#[derive(Debug, Clone)]
pub struct TmSession {
    client: Arc<TmClient>,
}

impl ControllerSession for TmSession {
    type Resource = TmFieldSet;

    async fn list_resources(&self) -> Result<Vec<TmFieldSet>, CoreError> {
        let fieldsets = self.client.list_fieldsets().await?;
        Ok(fieldsets
            .into_iter()
            .map(|info| TmFieldSet {
                client: Arc::clone(&self.client),
                id: info.id,
                name: info.name,
                state: SharedFieldsetState::default(),
                socket: Mutex::new(None),
            })
            .collect())
    }
}

// ── Field set ────────────────────────────────────────────────────────

/// One field set on a controller.
///
/// The folded field set state lives here rather than on the socket, so a
/// resubscribe after a drop continues from the last known match.
pub struct TmFieldSet {
    client: Arc<TmClient>,
    id: u32,
    name: String,
    state: SharedFieldsetState,
    socket: Mutex<Option<FieldsetSocket>>,
}

impl TmFieldSet {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl FieldSetResource for TmFieldSet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_fields(&self) -> Result<Vec<Field>, CoreError> {
        let fields = self.client.fieldset_fields(self.id).await?;
        Ok(fields.into_iter().map(Field::from).collect())
    }

    async fn subscribe(&self, events: mpsc::Sender<ResourceEvent>) -> Result<(), CoreError> {
        let (socket_tx, socket_rx) = mpsc::channel(SOCKET_CHANNEL_SIZE);
        let socket = self
            .client
            .open_fieldset_socket(self.id, Arc::clone(&self.state), socket_tx)
            .await?;
        tokio::spawn(bridge(socket_rx, events));

        if let Some(previous) = self.socket.lock().await.replace(socket) {
            debug!(field_set = %self.name, "replacing previous field set socket");
            previous.shutdown();
        }
        Ok(())
    }

    async fn unsubscribe(&self) {
        if let Some(socket) = self.socket.lock().await.take() {
            debug!(field_set = %self.name, "closing field set socket");
            socket.shutdown();
        }
    }

    async fn send_command(&self, command: FieldSetCommand) -> Result<(), CoreError> {
        let action = FieldsetAction::try_from(command)?;
        self.client.fieldset_action(self.id, &action).await?;
        Ok(())
    }
}

/// Forward socket events until the socket's reader or the session goes away.
async fn bridge(mut socket_rx: mpsc::Receiver<SocketEvent>, events: mpsc::Sender<ResourceEvent>) {
    while let Some(event) = socket_rx.recv().await {
        if events.send(ResourceEvent::from(event)).await.is_err() {
            break;
        }
    }
}
