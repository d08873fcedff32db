// ── Change detector ──

use std::collections::{BTreeMap, BTreeSet};

use strum::IntoEnumIterator;

use crate::model::{FlatState, Observer, Value, Variable};

/// The minimal set of variable updates and the observers they affect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub values: BTreeMap<Variable, Value>,
    pub observers: BTreeSet<Observer>,
}

impl StateUpdate {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.observers.is_empty()
    }
}

/// Compare `next` against the last published state.
///
/// Nothing published yet reads as every variable unset, so a variable that
/// is still unset in `next` is not a change.
pub fn detect_changes(previous: Option<&FlatState>, next: &FlatState) -> StateUpdate {
    let mut update = StateUpdate::default();

    for variable in Variable::iter() {
        let value = next.value(variable);
        let before = previous.map_or(Value::Unset, |prev| prev.value(variable));
        if before == value {
            continue;
        }
        if let Some(observer) = variable.observer() {
            update.observers.insert(observer);
        }
        update.values.insert(variable, value);
    }

    update
}
