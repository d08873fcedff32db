// ── Field set commands ──
//
// Mutations a host can ask the bound field set to perform. Field-targeted
// commands default to the currently active field.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{AudienceDisplay, FieldId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillsType {
    Programming,
    Driver,
}

/// A command for the bound field set.
///
/// `field_id: None` means "whichever field is active right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FieldSetCommand {
    QueueNextMatch,
    QueuePreviousMatch,
    QueueSkills { skills_type: SkillsType },
    StartMatch { field_id: Option<FieldId> },
    EndMatchEarly { field_id: Option<FieldId> },
    ResetTimer { field_id: Option<FieldId> },
    AbortMatch { field_id: Option<FieldId> },
    SetAudienceDisplay { display: AudienceDisplay },
}

impl FieldSetCommand {
    /// Fill in the target of field-targeted commands from `active`.
    ///
    /// Fails with [`SessionError::NoActiveField`] when a command needs a
    /// field and neither it nor `active` names one.
    pub fn resolve(self, active: Option<FieldId>) -> Result<Self, SessionError> {
        let target = |field_id: Option<FieldId>| {
            field_id
                .or(active)
                .map(Some)
                .ok_or(SessionError::NoActiveField)
        };

        Ok(match self {
            Self::StartMatch { field_id } => Self::StartMatch {
                field_id: target(field_id)?,
            },
            Self::EndMatchEarly { field_id } => Self::EndMatchEarly {
                field_id: target(field_id)?,
            },
            Self::ResetTimer { field_id } => Self::ResetTimer {
                field_id: target(field_id)?,
            },
            Self::AbortMatch { field_id } => Self::AbortMatch {
                field_id: target(field_id)?,
            },
            other => other,
        })
    }

    /// The field this command targets, if it targets one.
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            Self::StartMatch { field_id }
            | Self::EndMatchEarly { field_id }
            | Self::ResetTimer { field_id }
            | Self::AbortMatch { field_id } => *field_id,
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fills_active_field() {
        let cmd = FieldSetCommand::StartMatch { field_id: None };
        assert_eq!(
            cmd.resolve(Some(2)).unwrap(),
            FieldSetCommand::StartMatch { field_id: Some(2) }
        );
    }

    #[test]
    fn explicit_field_wins() {
        let cmd = FieldSetCommand::AbortMatch { field_id: Some(7) };
        assert_eq!(cmd.resolve(Some(2)).unwrap().field_id(), Some(7));
    }

    #[test]
    fn field_command_without_any_field_fails() {
        let cmd = FieldSetCommand::ResetTimer { field_id: None };
        assert!(matches!(cmd.resolve(None), Err(SessionError::NoActiveField)));
    }

    #[test]
    fn untargeted_commands_pass_through() {
        let cmd = FieldSetCommand::QueueSkills {
            skills_type: SkillsType::Driver,
        };
        assert_eq!(cmd.resolve(None).unwrap(), cmd);
    }
}
