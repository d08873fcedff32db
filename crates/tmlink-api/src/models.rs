// Wire types for the field set REST endpoints and WebSocket events.
//
// Field names follow the controller's JSON (camelCase, `fieldID`). Unknown
// enum tags deserialize into catch-all variants so a newer controller never
// breaks the stream.

use serde::{Deserialize, Serialize};

// ── REST payloads ────────────────────────────────────────────────────

/// A field set as listed by `GET /api/fieldsets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsetInfo {
    pub id: u32,
    pub name: String,
}

/// A field as listed by `GET /api/fieldsets/{id}/fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldsetList {
    #[serde(rename = "fieldSets")]
    pub field_sets: Vec<FieldsetInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldList {
    pub fields: Vec<FieldInfo>,
}

/// Body of `POST /api/fieldsets/{id}/actions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FieldsetAction {
    QueueNextMatch,
    QueuePreviousMatch,
    QueueSkills {
        #[serde(rename = "skillsType")]
        skills_type: SkillsType,
    },
    StartMatch {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    EndMatchEarly {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    ResetTimer {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    AbortMatch {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    SetAudienceDisplay {
        display: AudienceDisplay,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillsType {
    Programming,
    Driver,
}

// ── Field set state ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRound {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "PRACTICE")]
    Practice,
    #[serde(rename = "QUAL")]
    Qualification,
    #[serde(rename = "QF")]
    Quarterfinal,
    #[serde(rename = "SF")]
    Semifinal,
    #[serde(rename = "F")]
    Final,
    #[serde(rename = "R16")]
    RoundOf16,
    #[serde(rename = "R32")]
    RoundOf32,
    #[serde(rename = "R64")]
    RoundOf64,
    #[serde(rename = "R128")]
    RoundOf128,
    #[serde(rename = "TOP_N")]
    TopN,
    #[serde(rename = "ROUND_ROBIN")]
    RoundRobin,
    #[serde(rename = "SKILLS")]
    Skills,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(other)]
    Unknown,
}

/// Round, match number, and bracket instance of a scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTuple {
    pub round: MatchRound,
    #[serde(rename = "match")]
    pub number: u32,
    #[serde(default)]
    pub instance: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    Queued,
    Running,
    Paused,
    Ended,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudienceDisplay {
    Blank,
    Logo,
    Intro,
    InMatch,
    Results,
    Schedule,
    Rankings,
    ScRankings,
    AllianceSelection,
    Bracket,
    Award,
    Inspection,
}

/// What the field set currently has queued or running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveMatch {
    #[default]
    None,
    Timeout {
        #[serde(rename = "fieldID")]
        field_id: u32,
        state: QueueState,
    },
    Match {
        #[serde(rename = "fieldID")]
        field_id: u32,
        state: QueueState,
        #[serde(rename = "match")]
        tuple: MatchTuple,
    },
}

/// Full field set state, as sent in a `fieldsetState` event and folded
/// from incremental events afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsetState {
    #[serde(rename = "match", default)]
    pub active: ActiveMatch,
    #[serde(rename = "audienceDisplay", default)]
    pub audience_display: Option<AudienceDisplay>,
}

// ── WebSocket events ─────────────────────────────────────────────────

/// A single event pushed over the field set WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldsetEvent {
    FieldsetState {
        state: FieldsetState,
    },
    FieldMatchAssigned {
        #[serde(rename = "fieldID")]
        field_id: u32,
        #[serde(rename = "match", default)]
        tuple: Option<MatchTuple>,
    },
    FieldActivated {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    MatchStarted {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    MatchResumed {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    MatchPaused {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    MatchStopped {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    TimeoutStarted {
        #[serde(rename = "fieldID")]
        field_id: u32,
    },
    TimeoutStopped,
    AudienceDisplayChanged {
        display: AudienceDisplay,
    },
    #[serde(other)]
    Unknown,
}

impl FieldsetState {
    /// Fold one event into the state. Returns `true` if the state changed.
    pub fn apply(&mut self, event: FieldsetEvent) -> bool {
        let before = self.clone();

        match event {
            FieldsetEvent::FieldsetState { state } => *self = state,
            FieldsetEvent::FieldMatchAssigned { field_id, tuple } => {
                self.active = match tuple {
                    Some(tuple) => ActiveMatch::Match {
                        field_id,
                        state: QueueState::Queued,
                        tuple,
                    },
                    None => ActiveMatch::None,
                };
            }
            FieldsetEvent::FieldActivated { field_id } => self.retarget(field_id),
            FieldsetEvent::MatchStarted { field_id } | FieldsetEvent::MatchResumed { field_id } => {
                self.set_match_state(field_id, QueueState::Running);
            }
            FieldsetEvent::MatchPaused { field_id } => {
                self.set_match_state(field_id, QueueState::Paused);
            }
            FieldsetEvent::MatchStopped { field_id } => {
                self.set_match_state(field_id, QueueState::Ended);
            }
            FieldsetEvent::TimeoutStarted { field_id } => {
                self.active = ActiveMatch::Timeout {
                    field_id,
                    state: QueueState::Running,
                };
            }
            FieldsetEvent::TimeoutStopped => {
                if let ActiveMatch::Timeout { state, .. } = &mut self.active {
                    *state = QueueState::Ended;
                }
            }
            FieldsetEvent::AudienceDisplayChanged { display } => {
                self.audience_display = Some(display);
            }
            FieldsetEvent::Unknown => {}
        }

        *self != before
    }

    fn retarget(&mut self, new_field: u32) {
        match &mut self.active {
            ActiveMatch::None => {}
            ActiveMatch::Timeout { field_id, .. } | ActiveMatch::Match { field_id, .. } => {
                *field_id = new_field;
            }
        }
    }

    fn set_match_state(&mut self, new_field: u32, new_state: QueueState) {
        if let ActiveMatch::Match {
            field_id, state, ..
        } = &mut self.active
        {
            *field_id = new_field;
            *state = new_state;
        }
    }
}
