// ── Domain model ──

pub mod audience;
pub mod field;
pub mod match_state;
pub mod published;

pub use audience::AudienceDisplay;
pub use field::{Field, FieldId, find_field};
pub use match_state::{FieldSetSnapshot, MatchDescriptor, MatchRound, MatchState, QueueState};
pub use published::{FlatState, Observer, UNKNOWN_FIELD_NAME, Value, Variable, VariableSource};
