// ── API-to-domain type conversions ──
//
// Bridges raw `tmlink_api` wire types into canonical `tmlink_core::model`
// domain types, and domain commands back into wire actions.

use tmlink_api::SocketEvent;
use tmlink_api::models as wire;

use crate::command::{FieldSetCommand, SkillsType};
use crate::error::CoreError;
use crate::model::{
    AudienceDisplay, Field, FieldSetSnapshot, MatchDescriptor, MatchRound, MatchState, QueueState,
};
use crate::session::client::ResourceEvent;

impl From<wire::FieldInfo> for Field {
    fn from(info: wire::FieldInfo) -> Self {
        Field {
            id: info.id,
            name: info.name,
        }
    }
}

impl From<wire::MatchRound> for MatchRound {
    fn from(round: wire::MatchRound) -> Self {
        match round {
            wire::MatchRound::None => Self::None,
            wire::MatchRound::Practice => Self::Practice,
            wire::MatchRound::Qualification => Self::Qualification,
            wire::MatchRound::Quarterfinal => Self::Quarterfinal,
            wire::MatchRound::Semifinal => Self::Semifinal,
            wire::MatchRound::Final => Self::Final,
            wire::MatchRound::RoundOf16 => Self::RoundOf16,
            wire::MatchRound::RoundOf32 => Self::RoundOf32,
            wire::MatchRound::RoundOf64 => Self::RoundOf64,
            wire::MatchRound::RoundOf128 => Self::RoundOf128,
            wire::MatchRound::TopN => Self::TopN,
            wire::MatchRound::RoundRobin => Self::RoundRobin,
            wire::MatchRound::Skills => Self::Skills,
            wire::MatchRound::Timeout => Self::Timeout,
            wire::MatchRound::Unknown => Self::Unknown,
        }
    }
}

impl From<wire::QueueState> for QueueState {
    fn from(state: wire::QueueState) -> Self {
        match state {
            wire::QueueState::Queued => Self::Queued,
            wire::QueueState::Running => Self::Running,
            wire::QueueState::Paused => Self::Paused,
            wire::QueueState::Ended => Self::Ended,
            wire::QueueState::Unknown => Self::Unknown,
        }
    }
}

impl From<wire::AudienceDisplay> for AudienceDisplay {
    fn from(display: wire::AudienceDisplay) -> Self {
        match display {
            wire::AudienceDisplay::Blank => Self::Blank,
            wire::AudienceDisplay::Logo => Self::Logo,
            wire::AudienceDisplay::Intro => Self::Intro,
            wire::AudienceDisplay::InMatch => Self::InMatch,
            wire::AudienceDisplay::Results => Self::Results,
            wire::AudienceDisplay::Schedule => Self::Schedule,
            wire::AudienceDisplay::Rankings => Self::Rankings,
            wire::AudienceDisplay::ScRankings => Self::ScRankings,
            wire::AudienceDisplay::AllianceSelection => Self::AllianceSelection,
            wire::AudienceDisplay::Bracket => Self::Bracket,
            wire::AudienceDisplay::Award => Self::Award,
            wire::AudienceDisplay::Inspection => Self::Inspection,
        }
    }
}

impl From<AudienceDisplay> for wire::AudienceDisplay {
    fn from(display: AudienceDisplay) -> Self {
        match display {
            AudienceDisplay::Blank => Self::Blank,
            AudienceDisplay::Logo => Self::Logo,
            AudienceDisplay::Intro => Self::Intro,
            AudienceDisplay::InMatch => Self::InMatch,
            AudienceDisplay::Results => Self::Results,
            AudienceDisplay::Schedule => Self::Schedule,
            AudienceDisplay::Rankings => Self::Rankings,
            AudienceDisplay::ScRankings => Self::ScRankings,
            AudienceDisplay::AllianceSelection => Self::AllianceSelection,
            AudienceDisplay::Bracket => Self::Bracket,
            AudienceDisplay::Award => Self::Award,
            AudienceDisplay::Inspection => Self::Inspection,
        }
    }
}

impl From<wire::ActiveMatch> for MatchState {
    fn from(active: wire::ActiveMatch) -> Self {
        match active {
            wire::ActiveMatch::None => Self::None,
            wire::ActiveMatch::Timeout { field_id, state } => Self::Timeout {
                field_id,
                state: state.into(),
            },
            wire::ActiveMatch::Match {
                field_id,
                state,
                tuple,
            } => Self::Match {
                field_id,
                state: state.into(),
                descriptor: MatchDescriptor {
                    round: tuple.round.into(),
                    number: tuple.number,
                    instance: tuple.instance,
                },
            },
        }
    }
}

impl From<wire::FieldsetState> for FieldSetSnapshot {
    fn from(state: wire::FieldsetState) -> Self {
        FieldSetSnapshot {
            match_state: state.active.into(),
            audience_display: state.audience_display.map(Into::into),
        }
    }
}

impl From<SocketEvent> for ResourceEvent {
    fn from(event: SocketEvent) -> Self {
        match event {
            SocketEvent::State(state) => Self::StateChanged(state.into()),
            SocketEvent::Error(message) => Self::TransportError(message),
            SocketEvent::Closed => Self::Closed,
        }
    }
}

impl TryFrom<FieldSetCommand> for wire::FieldsetAction {
    type Error = CoreError;

    fn try_from(command: FieldSetCommand) -> Result<Self, CoreError> {
        let field = |field_id: Option<u32>| {
            field_id.ok_or_else(|| CoreError::ValidationFailed {
                message: "command has no target field".into(),
            })
        };

        Ok(match command {
            FieldSetCommand::QueueNextMatch => Self::QueueNextMatch,
            FieldSetCommand::QueuePreviousMatch => Self::QueuePreviousMatch,
            FieldSetCommand::QueueSkills { skills_type } => Self::QueueSkills {
                skills_type: match skills_type {
                    SkillsType::Programming => wire::SkillsType::Programming,
                    SkillsType::Driver => wire::SkillsType::Driver,
                },
            },
            FieldSetCommand::StartMatch { field_id } => Self::StartMatch {
                field_id: field(field_id)?,
            },
            FieldSetCommand::EndMatchEarly { field_id } => Self::EndMatchEarly {
                field_id: field(field_id)?,
            },
            FieldSetCommand::ResetTimer { field_id } => Self::ResetTimer {
                field_id: field(field_id)?,
            },
            FieldSetCommand::AbortMatch { field_id } => Self::AbortMatch {
                field_id: field(field_id)?,
            },
            FieldSetCommand::SetAudienceDisplay { display } => Self::SetAudienceDisplay {
                display: display.into(),
            },
        })
    }
}
