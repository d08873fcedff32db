// ── Controller client seam ──
//
// What the session needs from a controller, expressed as traits so the
// session logic runs the same against the real API and against fakes.

use std::future::Future;

use tokio::sync::mpsc;

use crate::command::FieldSetCommand;
use crate::config::Credentials;
use crate::error::CoreError;
use crate::model::{Field, FieldSetSnapshot};

/// What a live field set subscription reports, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    StateChanged(FieldSetSnapshot),
    /// The subscription ended. Sent at most once per `subscribe`.
    Closed,
    TransportError(String),
}

/// Entry point: turns credentials into an authenticated session.
pub trait ControllerClient: Send + Sync + 'static {
    type Session: ControllerSession;

    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, CoreError>> + Send;
}

/// An authenticated controller session.
pub trait ControllerSession: Send + Sync + 'static {
    type Resource: FieldSetResource;

    fn list_resources(&self) -> impl Future<Output = Result<Vec<Self::Resource>, CoreError>> + Send;
}

/// One field set on the controller.
pub trait FieldSetResource: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn fetch_fields(&self) -> impl Future<Output = Result<Vec<Field>, CoreError>> + Send;

    /// Open (or re-open) the live subscription, delivering into `events`.
    ///
    /// Re-subscribing replaces any previous subscription.
    fn subscribe(
        &self,
        events: mpsc::Sender<ResourceEvent>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Close the subscription without emitting [`ResourceEvent::Closed`].
    fn unsubscribe(&self) -> impl Future<Output = ()> + Send;

    fn send_command(
        &self,
        command: FieldSetCommand,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// The resource type reachable from a client.
pub type ResourceOf<C> = <<C as ControllerClient>::Session as ControllerSession>::Resource;
