// ── Match state domain types ──

use serde::{Deserialize, Serialize};

use super::audience::AudienceDisplay;
use super::field::FieldId;

/// Competition phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRound {
    None,
    Practice,
    Qualification,
    Quarterfinal,
    Semifinal,
    Final,
    RoundOf16,
    RoundOf32,
    RoundOf64,
    RoundOf128,
    TopN,
    RoundRobin,
    Skills,
    Timeout,
    /// A round tag this build does not recognize.
    Unknown,
}


/// Lifecycle of whatever a field has queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Queued,
    Running,
    Paused,
    Ended,
    Unknown,
}

impl QueueState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Round, number and bracket instance identifying one scheduled match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchDescriptor {
    pub round: MatchRound,
    pub number: u32,
    pub instance: Option<u32>,
}

impl MatchDescriptor {
    pub fn new(round: MatchRound, number: u32, instance: Option<u32>) -> Self {
        Self {
            round,
            number,
            instance,
        }
    }
}

/// What the field set currently has queued or running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchState {
    #[default]
    None,
    Timeout {
        field_id: FieldId,
        state: QueueState,
    },
    Match {
        field_id: FieldId,
        state: QueueState,
        descriptor: MatchDescriptor,
    },
}

impl MatchState {
    /// The field this state implicates, if any.
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            Self::None => None,
            Self::Timeout { field_id, .. } | Self::Match { field_id, .. } => Some(*field_id),
        }
    }

    pub fn queue_state(&self) -> Option<QueueState> {
        match self {
            Self::None => None,
            Self::Timeout { state, .. } | Self::Match { state, .. } => Some(*state),
        }
    }
}

/// The content of one push notification from a field set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSetSnapshot {
    pub match_state: MatchState,
    pub audience_display: Option<AudienceDisplay>,
}
