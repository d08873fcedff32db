//! Short, human-readable match labels.
//!
//! Both functions are total: every round, including ones this build does
//! not recognize, yields a label.

use crate::model::{MatchDescriptor, MatchRound, MatchState};

/// Label for a scheduled match, e.g. `Q12`, `QF 3-2`, `F1`.
///
/// Bracket rounds append `-{instance}`; when the instance is missing the
/// suffix is omitted.
pub fn match_label(descriptor: &MatchDescriptor) -> String {
    let n = descriptor.number;
    match descriptor.round {
        MatchRound::None => "NONE".into(),
        MatchRound::Practice => format!("P{n}"),
        MatchRound::Qualification => format!("Q{n}"),
        MatchRound::Quarterfinal => bracket("QF", descriptor),
        MatchRound::Semifinal => bracket("SF", descriptor),
        MatchRound::Final => bracket("F", descriptor),
        MatchRound::RoundOf16 => bracket("R16", descriptor),
        MatchRound::RoundOf32 => bracket("R32", descriptor),
        MatchRound::RoundOf64 => bracket("R64", descriptor),
        MatchRound::RoundOf128 => bracket("R128", descriptor),
        MatchRound::TopN => format!("F{n}"),
        MatchRound::RoundRobin => "ROUND ROBIN".into(),
        MatchRound::Skills => "SKILLS".into(),
        MatchRound::Timeout => "TIMEOUT".into(),
        MatchRound::Unknown => "UNKNOWN".into(),
    }
}

/// Label for whatever a field set has queued.
pub fn state_label(state: &MatchState) -> String {
    match state {
        MatchState::None => "NONE".into(),
        MatchState::Timeout { .. } => "TIMEOUT".into(),
        MatchState::Match { descriptor, .. } => match_label(descriptor),
    }
}

fn bracket(prefix: &str, descriptor: &MatchDescriptor) -> String {
    match descriptor.instance {
        Some(instance) => format!("{prefix} {}-{instance}", descriptor.number),
        None => format!("{prefix} {}", descriptor.number),
    }
}
