// ── State mapper ──
//
// Turns a pushed field set snapshot plus the field list into the flat
// record the session publishes. Pure and total.

use serde::{Deserialize, Serialize};

use crate::format::state_label;
use crate::model::{Field, FieldSetSnapshot, FlatState, QueueState, UNKNOWN_FIELD_NAME, find_field};

/// What to publish for the field when nothing is queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Field variables are unset whenever no field is implicated.
    #[default]
    Strict,
    /// Keep the last implicated field's id, sequence and name.
    RetainLastActive,
}

/// Derive the flat state for one snapshot.
pub fn map_state(snapshot: &FieldSetSnapshot, fields: &[Field]) -> FlatState {
    let field_id = snapshot.match_state.field_id();
    let found = field_id.and_then(|id| find_field(fields, id));

    FlatState {
        match_label: state_label(&snapshot.match_state),
        field_id,
        field_seq: found.map(|(seq, _)| seq),
        field_name: Some(
            found.map_or_else(|| UNKNOWN_FIELD_NAME.to_owned(), |(_, f)| f.name.clone()),
        ),
        match_is_running: snapshot.match_state.queue_state().map(QueueState::is_running),
        audience_display: snapshot.audience_display,
    }
}

/// Apply `policy` to a freshly mapped state.
pub fn apply_field_policy(
    mut next: FlatState,
    previous: Option<&FlatState>,
    policy: FieldPolicy,
) -> FlatState {
    if policy == FieldPolicy::RetainLastActive && next.field_id.is_none() {
        if let Some(prev) = previous.filter(|p| p.field_id.is_some()) {
            next.field_id = prev.field_id;
            next.field_seq = prev.field_seq;
            next.field_name.clone_from(&prev.field_name);
        }
    }
    next
}
