// ── Console host surface ──
//
// Prints what the session publishes, one line per variable, status change
// or observer result. JSON output emits one event object per line.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use tmlink_core::{Condition, HostSurface, Observer, SessionStatus, Value, Variable};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::print_output;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ConsoleEvent<'a> {
    Publish {
        values: &'a BTreeMap<Variable, Value>,
    },
    Status {
        status: SessionStatus,
        message: Option<&'a str>,
    },
    Condition {
        condition: String,
        value: bool,
    },
}

pub struct ConsoleSurface {
    format: OutputFormat,
    color: bool,
    echo: bool,
    conditions: Vec<Condition>,
    published: Mutex<BTreeMap<Variable, Value>>,
    has_state: watch::Sender<bool>,
}

impl ConsoleSurface {
    pub fn new(format: OutputFormat, color: bool, conditions: Vec<Condition>) -> Self {
        Self {
            format,
            color,
            echo: true,
            conditions,
            published: Mutex::new(BTreeMap::new()),
            has_state: watch::Sender::new(false),
        }
    }

    /// A surface that only records state, for one-shot commands.
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new(OutputFormat::Text, false, Vec::new())
        }
    }

    /// Wait until the session has published its first field set state.
    pub async fn wait_for_state(&self, timeout: Duration) -> Result<(), CliError> {
        let mut seen = self.has_state.subscribe();
        match tokio::time::timeout(timeout, seen.wait_for(|seen| *seen)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(CliError::SessionClosed),
            Err(_) => Err(CliError::Timeout {
                what: "field set state".into(),
                seconds: timeout.as_secs(),
            }),
        }
    }

    fn emit(&self, event: &ConsoleEvent<'_>, text: impl FnOnce() -> String) {
        if !self.echo {
            return;
        }
        match self.format {
            OutputFormat::Text => print_output(&text()),
            OutputFormat::Json => match serde_json::to_string(event) {
                Ok(line) => print_output(&line),
                Err(e) => warn!(error = %e, "failed to render console event"),
            },
        }
    }

    fn key(&self, key: &str) -> String {
        let padded = format!("{key:<18}");
        if self.color {
            padded.cyan().to_string()
        } else {
            padded
        }
    }

    fn status_text(&self, status: SessionStatus) -> String {
        let label = status.to_string();
        if !self.color {
            return label;
        }
        match status {
            SessionStatus::Ok => label.green().to_string(),
            SessionStatus::Connecting => label.yellow().to_string(),
            SessionStatus::BadConfig | SessionStatus::ConnectionFailure => label.red().to_string(),
            SessionStatus::Disconnected => label.dimmed().to_string(),
        }
    }
}

/// Stable name for a condition in console output.
pub fn describe(condition: Condition) -> String {
    match condition {
        Condition::AudienceDisplayIs(mode) => format!("display_is:{mode}"),
        Condition::ActiveFieldIs(field_id) => format!("field_is:{field_id}"),
    }
}

impl HostSurface for ConsoleSurface {
    fn publish(&self, values: &BTreeMap<Variable, Value>) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(values.iter().map(|(k, v)| (*k, v.clone())));
        self.has_state.send_replace(true);

        self.emit(&ConsoleEvent::Publish { values }, || {
            values
                .iter()
                .map(|(variable, value)| format!("{} {value}", self.key(variable.id())))
                .collect::<Vec<_>>()
                .join("\n")
        });
    }

    fn request_reevaluation(&self, observers: &[Observer]) {
        let published = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for condition in &self.conditions {
            if !observers.contains(&condition.observer()) {
                continue;
            }
            let value = condition.evaluate(&published);
            let name = describe(*condition);
            debug!(condition = %name, value, "observer re-evaluated");
            self.emit(
                &ConsoleEvent::Condition {
                    condition: name.clone(),
                    value,
                },
                || format!("{} {value}", self.key(&name)),
            );
        }
    }

    fn set_status(&self, status: SessionStatus, message: Option<&str>) {
        self.emit(&ConsoleEvent::Status { status, message }, || {
            let status = self.status_text(status);
            match message {
                Some(message) => format!("{} {status}: {message}", self.key("status")),
                None => format!("{} {status}", self.key("status")),
            }
        });
    }
}
