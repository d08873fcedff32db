//! Field set WebSocket event stream.
//!
//! Connects to a field set's WebSocket endpoint, folds each pushed
//! [`FieldsetEvent`] into a [`SharedFieldsetState`], and forwards the
//! resulting state through an `mpsc` channel in arrival order.
//!
//! Unlike a self-healing stream, a [`FieldsetSocket`] does not reconnect on
//! its own: a dropped connection is reported as [`SocketEvent::Closed`] and
//! the owner decides when to open a new one. The folded state outlives the
//! socket, so a replacement socket resumes from what the last one knew and
//! reports it before any new event.
//!
//! # Example
//!
//! ```rust,ignore
//! let state = SharedFieldsetState::default();
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let socket = client.open_fieldset_socket(fieldset_id, state, tx).await?;
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         SocketEvent::State(state) => println!("{state:?}"),
//!         SocketEvent::Error(e) => eprintln!("socket error: {e}"),
//!         SocketEvent::Closed => break,
//!     }
//! }
//!
//! socket.shutdown();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::models::{FieldsetEvent, FieldsetState};

/// Field set state shared by every socket opened for the same field set.
pub type SharedFieldsetState = Arc<Mutex<FieldsetState>>;

// ── SocketEvent ──────────────────────────────────────────────────────

/// What a running field set socket reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The folded field set state: once when the socket opens, then after
    /// every event that changed it.
    State(FieldsetState),
    /// A read error occurred. Always followed by [`Closed`](Self::Closed).
    Error(String),
    /// The connection ended (close frame, stream end, or read error).
    Closed,
}

// ── FieldsetSocket ───────────────────────────────────────────────────

/// Handle to a running field set WebSocket reader.
///
/// Dropping the handle or calling [`shutdown`](Self::shutdown) stops the
/// reader without emitting [`SocketEvent::Closed`].
pub struct FieldsetSocket {
    cancel: CancellationToken,
}

impl FieldsetSocket {
    /// Perform the WebSocket handshake and spawn the reader task.
    ///
    /// Returns only after the handshake succeeds, so a refused or rejected
    /// connection surfaces as an error here rather than as an event.
    pub async fn open(
        request: ClientRequestBuilder,
        state: SharedFieldsetState,
        events: mpsc::Sender<SocketEvent>,
    ) -> Result<Self, Error> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("field set WebSocket connected");

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let (_write, read) = ws_stream.split();
            read_loop(read, state, events, task_cancel).await;
        });

        Ok(Self { cancel })
    }

    /// Signal the reader task to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FieldsetSocket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Reader loop ──────────────────────────────────────────────────────

async fn read_loop<S>(
    mut read: S,
    state: SharedFieldsetState,
    events: mpsc::Sender<SocketEvent>,
    cancel: CancellationToken,
) where
    S: futures_util::Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    if cancel.is_cancelled() {
        return;
    }
    let resumed = lock(&state).clone();
    if events.send(SocketEvent::State(resumed)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("field set WebSocket reader cancelled");
                return;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let folded = fold_frame(&mut lock(&state), &text);
                        if let Some(next) = folded {
                            if events.send(SocketEvent::State(next)).await.is_err() {
                                // Owner went away; nothing left to report to.
                                return;
                            }
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "field set WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("field set WebSocket close frame received (no payload)");
                        }
                        let _ = events.send(SocketEvent::Closed).await;
                        return;
                    }
                    Some(Err(e)) => {
                        let _ = events.send(SocketEvent::Error(e.to_string())).await;
                        let _ = events.send(SocketEvent::Closed).await;
                        return;
                    }
                    None => {
                        tracing::info!("field set WebSocket stream ended");
                        let _ = events.send(SocketEvent::Closed).await;
                        return;
                    }
                    _ => {
                        // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
                    }
                }
            }
        }
    }
}

fn lock(state: &SharedFieldsetState) -> MutexGuard<'_, FieldsetState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse a text frame and fold it into `state`.
///
/// Returns the new state when the event changed it, `None` for malformed
/// frames and no-op events.
fn fold_frame(state: &mut FieldsetState, text: &str) -> Option<FieldsetState> {
    let event: FieldsetEvent = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse field set event");
            return None;
        }
    };

    tracing::trace!(?event, "field set event");
    state.apply(event).then(|| state.clone())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::stream;

    use super::*;
    use crate::models::{ActiveMatch, AudienceDisplay, QueueState};

    #[test]
    fn fold_frame_emits_changed_state() {
        let mut state = FieldsetState::default();
        let raw = r#"{"type":"audienceDisplayChanged","display":"RANKINGS"}"#;

        let next = fold_frame(&mut state, raw).unwrap();
        assert_eq!(next.audience_display, Some(AudienceDisplay::Rankings));

        // Same event again is a no-op.
        assert!(fold_frame(&mut state, raw).is_none());
    }

    #[test]
    fn fold_frame_skips_malformed_json() {
        let mut state = FieldsetState::default();
        assert!(fold_frame(&mut state, "not json at all").is_none());
        assert_eq!(state, FieldsetState::default());
    }

    #[tokio::test]
    async fn read_loop_reports_states_then_closed() {
        let frames = vec![
            Ok(tungstenite::Message::text(
                r#"{"type":"timeoutStarted","fieldID":7}"#,
            )),
            Ok(tungstenite::Message::Ping(Vec::<u8>::new().into())),
            Ok(tungstenite::Message::Close(None)),
        ];
        let (tx, mut rx) = mpsc::channel(8);

        read_loop(
            stream::iter(frames),
            SharedFieldsetState::default(),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            rx.recv().await,
            Some(SocketEvent::State(FieldsetState::default()))
        );
        assert_eq!(
            rx.recv().await,
            Some(SocketEvent::State(FieldsetState {
                active: ActiveMatch::Timeout {
                    field_id: 7,
                    state: QueueState::Running,
                },
                audience_display: None,
            }))
        );
        assert_eq!(rx.recv().await, Some(SocketEvent::Closed));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn reopened_socket_resumes_folded_state() {
        let state = SharedFieldsetState::default();
        let full = r#"{"type":"fieldsetState","state":{"match":{"type":"TIMEOUT","fieldID":2,"state":"RUNNING"}}}"#;
        let (tx, mut rx) = mpsc::channel(8);
        read_loop(
            stream::iter(vec![
                Ok(tungstenite::Message::text(full)),
                Err(tungstenite::Error::ConnectionClosed),
            ]),
            Arc::clone(&state),
            tx,
            CancellationToken::new(),
        )
        .await;
        while rx.recv().await.is_some() {}

        let running_on_two = ActiveMatch::Timeout {
            field_id: 2,
            state: QueueState::Running,
        };
        let partial = r#"{"type":"audienceDisplayChanged","display":"RANKINGS"}"#;
        let (tx, mut rx) = mpsc::channel(8);
        read_loop(
            stream::iter(vec![Ok(tungstenite::Message::text(partial))]),
            state,
            tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            rx.recv().await,
            Some(SocketEvent::State(FieldsetState {
                active: running_on_two.clone(),
                audience_display: None,
            }))
        );
        assert_eq!(
            rx.recv().await,
            Some(SocketEvent::State(FieldsetState {
                active: running_on_two,
                audience_display: Some(AudienceDisplay::Rankings),
            }))
        );
        assert_eq!(rx.recv().await, Some(SocketEvent::Closed));
    }

    #[tokio::test]
    async fn read_loop_reports_error_before_closed() {
        let frames = vec![Err(tungstenite::Error::ConnectionClosed)];
        let (tx, mut rx) = mpsc::channel(8);

        read_loop(
            stream::iter(frames),
            SharedFieldsetState::default(),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(rx.recv().await, Some(SocketEvent::State(_))));
        assert!(matches!(rx.recv().await, Some(SocketEvent::Error(_))));
        assert_eq!(rx.recv().await, Some(SocketEvent::Closed));
    }

    #[tokio::test]
    async fn cancelled_reader_stays_silent() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, mut rx) = mpsc::channel(8);

        read_loop(
            stream::pending::<Result<tungstenite::Message, tungstenite::Error>>(),
            SharedFieldsetState::default(),
            tx,
            cancel,
        )
        .await;

        assert_eq!(rx.recv().await, None);
    }
}
