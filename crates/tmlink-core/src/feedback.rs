// ── Feedback observers ──
//
// Boolean conditions a host re-evaluates when the session reports that the
// variables behind them changed.

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::model::{AudienceDisplay, Field, FieldId, Observer, Value, Variable, VariableSource};

/// True iff the published audience display is defined and equals `target`.
pub fn audience_display_is(published: &impl VariableSource, target: AudienceDisplay) -> bool {
    match published.variable(Variable::AudienceDisplay) {
        Value::Text(id) => id == target.id(),
        _ => false,
    }
}

/// True iff the published field id is defined and equals `target`.
pub fn active_field_is(published: &impl VariableSource, target: FieldId) -> bool {
    published.variable(Variable::FieldId) == Value::Number(target)
}

/// One selectable option offered to the host for an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

/// Choices for the active-field observer, in field list order.
pub fn field_choices(fields: &[Field]) -> Vec<Choice> {
    fields
        .iter()
        .map(|field| Choice {
            id: field.id.to_string(),
            label: field.name.clone(),
        })
        .collect()
}

/// Choices for the audience-display observer. The first entry is the default.
pub fn display_choices() -> Vec<Choice> {
    AudienceDisplay::iter()
        .map(|mode| Choice {
            id: mode.id().to_owned(),
            label: mode.label().to_owned(),
        })
        .collect()
}

/// A configured observer condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    AudienceDisplayIs(AudienceDisplay),
    ActiveFieldIs(FieldId),
}

impl Condition {
    pub fn observer(self) -> Observer {
        match self {
            Self::AudienceDisplayIs(_) => Observer::AudienceDisplay,
            Self::ActiveFieldIs(_) => Observer::ActiveField,
        }
    }

    pub fn evaluate(self, published: &impl VariableSource) -> bool {
        match self {
            Self::AudienceDisplayIs(target) => audience_display_is(published, target),
            Self::ActiveFieldIs(target) => active_field_is(published, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::FlatState;

    #[test]
    fn unset_display_is_never_a_match() {
        let state = FlatState::default();
        assert!(!audience_display_is(&state, AudienceDisplay::Blank));
    }

    #[test]
    fn display_compares_by_mode() {
        let state = FlatState {
            audience_display: Some(AudienceDisplay::Rankings),
            ..FlatState::default()
        };
        assert!(audience_display_is(&state, AudienceDisplay::Rankings));
        assert!(!audience_display_is(&state, AudienceDisplay::ScRankings));
    }

    #[test]
    fn active_field_reads_accumulated_values() {
        let mut published = BTreeMap::new();
        assert!(!active_field_is(&published, 2));

        published.insert(Variable::FieldId, Value::Number(2));
        assert!(active_field_is(&published, 2));
        assert!(!Condition::ActiveFieldIs(3).evaluate(&published));

        published.insert(Variable::FieldId, Value::Unset);
        assert!(!active_field_is(&published, 2));
    }

    #[test]
    fn choices_follow_list_order() {
        let fields = vec![Field::new(9, "Blue"), Field::new(5, "Red")];
        let choices = field_choices(&fields);
        assert_eq!(choices[0].id, "9");
        assert_eq!(choices[1].label, "Red");

        let displays = display_choices();
        assert_eq!(displays.len(), 12);
        assert_eq!(displays[0].label, "None");
        assert_eq!(displays[2].label, "Up Next");
    }
}
