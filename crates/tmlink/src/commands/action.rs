//! `tmlink action`: send one command to the configured field set.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::debug;

use tmlink_core::{FieldId, FieldSetCommand, SessionManager, SkillsType};

use crate::cli::{ActionArgs, GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::console::ConsoleSurface;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Sent<'a> {
    field_set: &'a str,
    #[serde(flatten)]
    command: FieldSetCommand,
}

pub async fn handle(args: ActionArgs, resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let command = FieldSetCommand::from(args.command);
    // Resolving against no field fails exactly when the command needs the
    // active field, which is only known once the first state arrives.
    let needs_state = command.resolve(None).is_err();

    let surface = Arc::new(ConsoleSurface::silent());
    let field_set = resolved.field_set().to_owned();
    let (handle, task) =
        SessionManager::new(resolved.controller(), Arc::clone(&surface), resolved.options).spawn();

    let result = async {
        handle.start(resolved.settings).await?;
        if needs_state {
            debug!(field_set = %field_set, "waiting for the active field");
            surface.wait_for_state(resolved.timeout).await?;
        }
        handle.send_command(command).await?;
        Ok::<(), CliError>(())
    }
    .await;

    handle.stop().await;
    let _ = task.await;
    result?;

    let out = match global.output {
        OutputFormat::Json => output::render_json(&Sent {
            field_set: &field_set,
            command,
        })?,
        OutputFormat::Text => {
            let mark = if output::should_color(global.color) {
                "✓".green().to_string()
            } else {
                "✓".to_owned()
            };
            format!("{mark} {} sent to {field_set}", describe(command))
        }
    };
    output::print_output(&out);
    Ok(())
}

fn describe(command: FieldSetCommand) -> String {
    match command {
        FieldSetCommand::QueueNextMatch => "queue next match".into(),
        FieldSetCommand::QueuePreviousMatch => "queue previous match".into(),
        FieldSetCommand::QueueSkills { skills_type } => {
            format!("queue {} skills", skills_label(skills_type))
        }
        FieldSetCommand::StartMatch { field_id } => on_field("start match", field_id),
        FieldSetCommand::EndMatchEarly { field_id } => on_field("end match early", field_id),
        FieldSetCommand::ResetTimer { field_id } => on_field("reset timer", field_id),
        FieldSetCommand::AbortMatch { field_id } => on_field("abort match", field_id),
        FieldSetCommand::SetAudienceDisplay { display } => {
            format!("audience display {}", display.label())
        }
    }
}

fn on_field(what: &str, field_id: Option<FieldId>) -> String {
    match field_id {
        Some(id) => format!("{what} (field {id})"),
        None => format!("{what} (active field)"),
    }
}

fn skills_label(skills_type: SkillsType) -> &'static str {
    match skills_type {
        SkillsType::Programming => "programming",
        SkillsType::Driver => "driver",
    }
}
