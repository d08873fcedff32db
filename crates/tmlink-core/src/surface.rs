// ── Host surface ──
//
// The session never renders anything itself. It pushes variable updates,
// observer re-evaluation requests and status changes into a `HostSurface`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use strum::Display;

use crate::model::{Observer, Value, Variable};

/// Connection status reported to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    BadConfig,
    Connecting,
    Ok,
    ConnectionFailure,
}

/// Where a session publishes what it learns.
///
/// Calls are made from the session task, one at a time, in the order the
/// session produced them.
pub trait HostSurface: Send + Sync + 'static {
    /// Set the given variables. Variables not in `values` keep their value.
    fn publish(&self, values: &BTreeMap<Variable, Value>);

    /// Re-evaluate the conditions of the given observers.
    fn request_reevaluation(&self, observers: &[Observer]);

    fn set_status(&self, status: SessionStatus, message: Option<&str>);
}

impl<T: HostSurface + ?Sized> HostSurface for Arc<T> {
    fn publish(&self, values: &BTreeMap<Variable, Value>) {
        (**self).publish(values);
    }

    fn request_reevaluation(&self, observers: &[Observer]) {
        (**self).request_reevaluation(observers);
    }

    fn set_status(&self, status: SessionStatus, message: Option<&str>) {
        (**self).set_status(status, message);
    }
}
