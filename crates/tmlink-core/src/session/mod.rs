//! Field set session lifecycle.
//!
//! A [`SessionManager`] owns everything about one controller connection:
//! the authenticated session, the bound field set and its field list, the
//! live subscription, the reconnect timer and the last published
//! [`FlatState`]. It is driven either directly (tests, single-shot CLI
//! commands) or by [`SessionManager::run`] on its own task, fed by a
//! cloneable [`SessionHandle`].
//!
//! ```text
//! Disconnected ──start──▶ Connecting ──▶ Ok ──Closed──▶ Disconnected (timer armed)
//!                              │                              │
//!                              ├──▶ BadConfig                 └──tick ok──▶ Ok
//!                              └──▶ ConnectionFailure
//! ```
//!
//! `BadConfig` and `ConnectionFailure` are never retried automatically;
//! only a subscription that closes after reaching `Ok` starts the
//! reconnect loop, and it runs until it succeeds or the session is
//! reconfigured or stopped.

pub mod client;
mod reconnect;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::FieldSetCommand;
use crate::config::{SessionOptions, SessionSettings, ValidatedSettings};
use crate::diff::detect_changes;
use crate::error::{SessionError, SessionStep};
use crate::mapper::{apply_field_policy, map_state};
use crate::model::{Field, FieldSetSnapshot, FlatState, Observer};
use crate::surface::{HostSurface, SessionStatus};

use self::client::{
    ControllerClient, ControllerSession, FieldSetResource, ResourceEvent, ResourceOf,
};
use self::reconnect::ReconnectTimer;

const EVENT_CHANNEL_SIZE: usize = 64;
const REQUEST_CHANNEL_SIZE: usize = 16;

// ── Requests ─────────────────────────────────────────────────────────

/// A request envelope sent to the session task, with its reply channel.
pub(crate) enum SessionRequest {
    Start {
        settings: SessionSettings,
        response_tx: oneshot::Sender<Result<(), SessionError>>,
    },
    Reconfigure {
        settings: SessionSettings,
        response_tx: oneshot::Sender<Result<(), SessionError>>,
    },
    Command {
        command: FieldSetCommand,
        response_tx: oneshot::Sender<Result<(), SessionError>>,
    },
    Stop {
        response_tx: oneshot::Sender<()>,
    },
}

// ── Binding ──────────────────────────────────────────────────────────

/// The field set a session is bound to, plus what it learned while binding.
struct Binding<C: ControllerClient> {
    /// Keeps the authenticated session alive for the resource's lifetime.
    _session: C::Session,
    resource: ResourceOf<C>,
    fields: Vec<Field>,
    events_tx: mpsc::Sender<ResourceEvent>,
    events_rx: mpsc::Receiver<ResourceEvent>,
}

// ── SessionManager ───────────────────────────────────────────────────

pub struct SessionManager<C: ControllerClient, H: HostSurface> {
    client: C,
    host: H,
    options: SessionOptions,
    status: watch::Sender<SessionStatus>,
    binding: Option<Binding<C>>,
    published: Option<FlatState>,
    reconnect: ReconnectTimer,
    ticks_tx: mpsc::Sender<()>,
    ticks_rx: mpsc::Receiver<()>,
}

impl<C: ControllerClient, H: HostSurface> SessionManager<C, H> {
    pub fn new(client: C, host: H, options: SessionOptions) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::channel(1);
        let (status, _) = watch::channel(SessionStatus::Disconnected);

        Self {
            client,
            host,
            options,
            status,
            binding: None,
            published: None,
            reconnect: ReconnectTimer::new(options.reconnect_interval),
            ticks_tx,
            ticks_rx,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// The last state handed to the host, if anything was published yet.
    pub fn published(&self) -> Option<&FlatState> {
        self.published.as_ref()
    }

    /// Field list of the bound field set (empty when unbound).
    pub fn fields(&self) -> &[Field] {
        self.binding.as_ref().map_or(&[][..], |b| b.fields.as_slice())
    }

    /// Name of the bound field set.
    pub fn field_set(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.resource.name())
    }

    pub fn is_reconnect_armed(&self) -> bool {
        self.reconnect.is_armed()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Validate `settings`, authenticate, bind the named field set and open
    /// its subscription.
    ///
    /// Any previous binding is released first. Failures set `BadConfig` or
    /// `ConnectionFailure` and are not retried.
    pub async fn start(&mut self, settings: &SessionSettings) -> Result<(), SessionError> {
        self.release().await;

        let validated = match settings.validate() {
            Ok(validated) => validated,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_status(SessionStatus::Connecting, None);
        match self.establish(&validated).await {
            Ok(binding) => {
                info!(
                    field_set = %validated.field_set,
                    fields = binding.fields.len(),
                    "field set session established"
                );
                self.binding = Some(binding);
                self.set_status(SessionStatus::Ok, None);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Tear down the current binding and start over with new settings.
    pub async fn reconfigure(&mut self, settings: &SessionSettings) -> Result<(), SessionError> {
        self.release().await;
        self.set_status(SessionStatus::Disconnected, Some("config updated"));
        self.start(settings).await
    }

    /// Disarm the reconnect timer and release the binding.
    pub async fn stop(&mut self) {
        self.release().await;
        debug!("session stopped");
    }

    /// Forward a command to the bound field set.
    pub async fn send_command(&self, command: FieldSetCommand) -> Result<(), SessionError> {
        let binding = self.binding.as_ref().ok_or(SessionError::NotConnected)?;
        let active = self.published.as_ref().and_then(|p| p.field_id);
        let command = command.resolve(active)?;

        debug!(field_set = %binding.resource.name(), ?command, "sending field set command");
        binding
            .resource
            .send_command(command)
            .await
            .map_err(|source| SessionError::Transport {
                step: SessionStep::Command {
                    field_set: binding.resource.name().to_owned(),
                },
                source,
            })
    }

    // ── Event handling ───────────────────────────────────────────────

    /// Process one event from the bound field set's subscription.
    pub fn handle_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::StateChanged(snapshot) => self.apply_snapshot(&snapshot),
            ResourceEvent::Closed => self.on_closed(),
            ResourceEvent::TransportError(error) => {
                warn!(
                    field_set = self.field_set().unwrap_or_default(),
                    error = %error,
                    "field set transport error"
                );
            }
        }
    }

    /// One reconnect attempt: re-open the bound subscription.
    pub async fn reconnect_tick(&mut self) {
        if !self.reconnect.is_armed() {
            return;
        }
        let Some(binding) = self.binding.as_ref() else {
            warn!("reconnect tick without a bound field set");
            self.disarm_reconnect();
            return;
        };

        let name = binding.resource.name().to_owned();
        debug!(field_set = %name, "reconnecting to field set");
        match binding.resource.subscribe(binding.events_tx.clone()).await {
            Ok(()) => {
                info!(field_set = %name, "field set connection restored");
                self.disarm_reconnect();
                self.set_status(SessionStatus::Ok, None);
            }
            Err(e) => debug!(field_set = %name, error = %e, "reconnect attempt failed"),
        }
    }

    // ── Run loop ─────────────────────────────────────────────────────

    /// Move the manager onto its own task and return a handle to it.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let handle = SessionHandle {
            requests: requests_tx,
            status: self.subscribe_status(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(self.run(requests_rx, cancel));
        (handle, task)
    }

    /// Process requests, reconnect ticks and field set events, one at a
    /// time, until stopped, cancelled, or every handle is dropped.
    pub(crate) async fn run(
        mut self,
        mut requests: mpsc::Receiver<SessionRequest>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    if !self.handle_request(request).await {
                        return;
                    }
                }
                Some(()) = self.ticks_rx.recv() => self.reconnect_tick().await,
                Some(event) = next_event(self.binding.as_mut()) => self.handle_event(event),
            }
        }

        self.stop().await;
    }

    /// Returns `false` once the loop should end.
    async fn handle_request(&mut self, request: SessionRequest) -> bool {
        match request {
            SessionRequest::Start {
                settings,
                response_tx,
            } => {
                let result = self.start(&settings).await;
                let _ = response_tx.send(result);
            }
            SessionRequest::Reconfigure {
                settings,
                response_tx,
            } => {
                let result = self.reconfigure(&settings).await;
                let _ = response_tx.send(result);
            }
            SessionRequest::Command {
                command,
                response_tx,
            } => {
                let result = self.send_command(command).await;
                let _ = response_tx.send(result);
            }
            SessionRequest::Stop { response_tx } => {
                self.stop().await;
                let _ = response_tx.send(());
                return false;
            }
        }
        true
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn establish(&self, validated: &ValidatedSettings) -> Result<Binding<C>, SessionError> {
        let name = &validated.field_set;

        debug!(address = %validated.credentials.address, "authenticating with controller");
        let session = self
            .client
            .authenticate(&validated.credentials)
            .await
            .map_err(|source| SessionError::Transport {
                step: SessionStep::Authenticate,
                source,
            })?;

        debug!("listing field sets");
        let resources = session
            .list_resources()
            .await
            .map_err(|source| SessionError::Transport {
                step: SessionStep::ListFieldSets,
                source,
            })?;
        let resource = resources
            .into_iter()
            .find(|r| r.name() == name.as_str())
            .ok_or_else(|| SessionError::ResourceNotFound { name: name.clone() })?;

        debug!(field_set = %name, "fetching fields");
        let fields = resource
            .fetch_fields()
            .await
            .map_err(|source| SessionError::Transport {
                step: SessionStep::FetchFields {
                    field_set: name.clone(),
                },
                source,
            })?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        debug!(field_set = %name, "subscribing to field set");
        resource
            .subscribe(events_tx.clone())
            .await
            .map_err(|source| SessionError::Transport {
                step: SessionStep::Subscribe {
                    field_set: name.clone(),
                },
                source,
            })?;

        Ok(Binding {
            _session: session,
            resource,
            fields,
            events_tx,
            events_rx,
        })
    }

    /// Disarm the timer, close the subscription and drop the binding.
    async fn release(&mut self) {
        self.disarm_reconnect();
        if let Some(binding) = self.binding.take() {
            debug!(field_set = %binding.resource.name(), "releasing field set");
            binding.resource.unsubscribe().await;
        }
    }

    fn disarm_reconnect(&mut self) {
        if self.reconnect.disarm() {
            debug!("reconnect timer disarmed");
        }
        // Drop a tick that was already queued.
        while self.ticks_rx.try_recv().is_ok() {}
    }

    fn apply_snapshot(&mut self, snapshot: &FieldSetSnapshot) {
        let mapped = map_state(snapshot, self.fields());
        let next = apply_field_policy(mapped, self.published.as_ref(), self.options.field_policy);
        let update = detect_changes(self.published.as_ref(), &next);

        if !update.values.is_empty() {
            debug!(changed = update.values.len(), "publishing field set state");
            self.host.publish(&update.values);
        }
        if !update.observers.is_empty() {
            let observers: Vec<Observer> = update.observers.into_iter().collect();
            self.host.request_reevaluation(&observers);
        }
        self.published = Some(next);
    }

    fn on_closed(&mut self) {
        let name = self.field_set().unwrap_or_default().to_owned();
        warn!(field_set = %name, "field set closed");
        self.set_status(
            SessionStatus::Disconnected,
            Some(&format!("Field set {name} closed")),
        );

        if self.binding.is_some() && self.reconnect.arm(self.ticks_tx.clone()) {
            debug!(
                field_set = %name,
                interval_secs = self.options.reconnect_interval.as_secs(),
                "reconnect timer armed"
            );
        }
    }

    fn fail(&self, error: SessionError) -> SessionError {
        warn!(error = %error, "field set session failed");
        self.set_status(error.status(), Some(&error.to_string()));
        error
    }

    fn set_status(&self, status: SessionStatus, message: Option<&str>) {
        debug!(%status, message, "session status");
        self.status.send_replace(status);
        self.host.set_status(status, message);
    }
}

async fn next_event<C: ControllerClient>(binding: Option<&mut Binding<C>>) -> Option<ResourceEvent> {
    match binding {
        Some(binding) => binding.events_rx.recv().await,
        None => std::future::pending().await,
    }
}

// ── SessionHandle ────────────────────────────────────────────────────

/// Cloneable handle to a session running on its own task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<SessionRequest>,
    status: watch::Receiver<SessionStatus>,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub async fn start(&self, settings: SessionSettings) -> Result<(), SessionError> {
        self.request(|response_tx| SessionRequest::Start {
            settings,
            response_tx,
        })
        .await?
    }

    pub async fn reconfigure(&self, settings: SessionSettings) -> Result<(), SessionError> {
        self.request(|response_tx| SessionRequest::Reconfigure {
            settings,
            response_tx,
        })
        .await?
    }

    pub async fn send_command(&self, command: FieldSetCommand) -> Result<(), SessionError> {
        self.request(|response_tx| SessionRequest::Command {
            command,
            response_tx,
        })
        .await?
    }

    /// Release the binding and end the session task.
    pub async fn stop(&self) {
        if self
            .request(|response_tx| SessionRequest::Stop { response_tx })
            .await
            .is_err()
        {
            debug!("session already stopped");
        }
    }

    /// End the session task without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionRequest,
    ) -> Result<T, SessionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.requests
            .send(build(response_tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        response_rx.await.map_err(|_| SessionError::Closed)
    }
}
