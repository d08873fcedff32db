// ── Published state ──
//
// `FlatState` is the derived record the session publishes. Each of its
// fields is exposed to the host as one `Variable` carrying a `Value`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use super::audience::AudienceDisplay;
use super::field::FieldId;

/// Field name published when the implicated field is unknown.
pub const UNKNOWN_FIELD_NAME: &str = "UNKNOWN";

/// Flat, diffable view of a field set, recomputed on every notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatState {
    pub match_label: String,
    pub field_id: Option<FieldId>,
    /// 1-based position of the field in the field set's list.
    pub field_seq: Option<u32>,
    pub field_name: Option<String>,
    pub match_is_running: Option<bool>,
    pub audience_display: Option<AudienceDisplay>,
}

impl FlatState {
    /// The published value of one variable.
    pub fn value(&self, variable: Variable) -> Value {
        match variable {
            Variable::Match => Value::Text(self.match_label.clone()),
            Variable::FieldId => self.field_id.map_or(Value::Unset, Value::Number),
            Variable::FieldSeq => self.field_seq.map_or(Value::Unset, Value::Number),
            Variable::FieldName => self
                .field_name
                .as_ref()
                .map_or(Value::Unset, |name| Value::Text(name.clone())),
            Variable::MatchIsRunning => self.match_is_running.map_or(Value::Unset, Value::Bool),
            Variable::AudienceDisplay => self
                .audience_display
                .map_or(Value::Unset, |mode| Value::Text(mode.id().to_owned())),
        }
    }
}

// ── Variables ────────────────────────────────────────────────────────

/// A named value published to the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Variable {
    Match,
    FieldId,
    FieldSeq,
    FieldName,
    MatchIsRunning,
    AudienceDisplay,
}

impl Variable {
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Match => "Match",
            Self::FieldId => "Field ID",
            Self::FieldSeq => "Field Sequence",
            Self::FieldName => "Field Name",
            Self::MatchIsRunning => "Match Is Running",
            Self::AudienceDisplay => "Audience Display",
        }
    }

    /// The observer whose condition depends on this variable.
    pub fn observer(self) -> Option<Observer> {
        match self {
            Self::AudienceDisplay => Some(Observer::AudienceDisplay),
            Self::FieldId => Some(Observer::ActiveField),
            _ => None,
        }
    }
}

/// A published variable value. `Unset` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(u32),
    Bool(bool),
    Unset,
}

impl Value {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Unset => f.write_str("-"),
        }
    }
}

/// Anything variables can be read from: a full state, or the host's
/// accumulated map of published values.
pub trait VariableSource {
    fn variable(&self, variable: Variable) -> Value;
}

impl VariableSource for FlatState {
    fn variable(&self, variable: Variable) -> Value {
        self.value(variable)
    }
}

impl VariableSource for BTreeMap<Variable, Value> {
    fn variable(&self, variable: Variable) -> Value {
        self.get(&variable).cloned().unwrap_or(Value::Unset)
    }
}

// ── Observers ────────────────────────────────────────────────────────

/// A host-side boolean condition that must be re-evaluated when the
/// variables it reads change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Observer {
    AudienceDisplay,
    ActiveField,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_publish_unset() {
        let state = FlatState {
            match_label: "NONE".into(),
            ..FlatState::default()
        };
        assert_eq!(state.value(Variable::Match), Value::Text("NONE".into()));
        assert!(state.value(Variable::FieldSeq).is_unset());
        assert!(state.value(Variable::AudienceDisplay).is_unset());
    }

    #[test]
    fn audience_display_publishes_its_id() {
        let state = FlatState {
            audience_display: Some(AudienceDisplay::InMatch),
            ..FlatState::default()
        };
        assert_eq!(
            state.value(Variable::AudienceDisplay),
            Value::Text("in_match".into())
        );
    }

    #[test]
    fn value_json_shape() {
        assert_eq!(serde_json::to_string(&Value::Unset).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::Number(4)).unwrap(), "4");
        assert_eq!(Variable::MatchIsRunning.to_string(), "match_is_running");
    }
}
