//! Session layer between `tmlink-api` and host surfaces (CLI, control panels).
//!
//! - **[`SessionManager`]**: owns one controller connection. It validates
//!   [`SessionSettings`], authenticates, binds a field set by name, keeps its
//!   subscription alive with an idempotent reconnect timer, and publishes
//!   every pushed state to a [`HostSurface`]. [`SessionManager::spawn`] moves
//!   it onto its own task behind a cloneable [`SessionHandle`].
//!
//! - **Pure pipeline**: [`format`] turns match descriptors into short labels,
//!   [`mapper`] turns a [`FieldSetSnapshot`] into a [`FlatState`], and
//!   [`diff`] finds the minimal [`StateUpdate`] plus the observers to
//!   re-evaluate.
//!
//! - **Controller seam** ([`session::client`]): traits the session drives.
//!   [`tm::TmController`] implements them over the tournament manager API.
//!
//! - **Feedback** ([`feedback`]): boolean observer conditions a host
//!   evaluates against the published variables.

pub mod command;
pub mod config;
pub mod convert;
pub mod diff;
pub mod error;
pub mod feedback;
pub mod format;
pub mod mapper;
pub mod model;
pub mod session;
pub mod surface;
pub mod tm;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{FieldSetCommand, SkillsType};
pub use config::{
    Credentials, DEFAULT_FIELD_SET, DEFAULT_RECONNECT_INTERVAL, SessionOptions, SessionSettings,
};
pub use diff::{StateUpdate, detect_changes};
pub use error::{CoreError, SessionError, SessionStep};
pub use feedback::{Choice, Condition};
pub use mapper::{FieldPolicy, apply_field_policy, map_state};
pub use session::client::ResourceEvent;
pub use session::{SessionHandle, SessionManager};
pub use surface::{HostSurface, SessionStatus};
pub use tm::{DEFAULT_TOKEN_URL, TmController};

pub use model::{
    AudienceDisplay, Field, FieldId, FieldSetSnapshot, FlatState, MatchDescriptor, MatchRound,
    MatchState, Observer, QueueState, Value, Variable,
};
