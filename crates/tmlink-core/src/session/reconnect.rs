// ── Reconnect timer ──
//
// At most one timer per session. While armed, a background task pushes a
// tick into a capacity-1 channel every period; ticks coalesce when the
// session is still busy with the previous attempt.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub(crate) struct ReconnectTimer {
    period: Duration,
    armed: Option<CancellationToken>,
}

impl ReconnectTimer {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            armed: None,
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Start ticking into `ticks`. Returns `false` if already armed.
    pub(crate) fn arm(&mut self, ticks: mpsc::Sender<()>) -> bool {
        if self.armed.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let period = self.period;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = interval.tick() => match ticks.try_send(()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(())) => trace!("reconnect tick coalesced"),
                        Err(TrySendError::Closed(())) => break,
                    },
                }
            }
        });

        self.armed = Some(cancel);
        true
    }

    /// Stop ticking. Returns `false` if the timer was not armed.
    pub(crate) fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
