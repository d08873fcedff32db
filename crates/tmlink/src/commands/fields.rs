//! `tmlink fields`: list the fields of the configured field set.

use serde::Serialize;
use tabled::Tabled;

use tmlink_core::feedback::field_choices;
use tmlink_core::session::client::FieldSetResource;
use tmlink_core::{Choice, SessionStep};

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

/// One active-field choice with its 1-based position, as published in
/// `field_seq`.
#[derive(Debug, Serialize)]
struct FieldEntry {
    seq: usize,
    #[serde(flatten)]
    choice: Choice,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Seq")]
    seq: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

pub async fn handle(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let (validated, field_sets) = super::list_field_sets(resolved).await?;
    let field_set = field_sets
        .into_iter()
        .find(|fs| fs.name() == validated.field_set)
        .ok_or_else(|| CliError::FieldSetNotFound {
            name: validated.field_set.clone(),
        })?;

    let fields = field_set
        .fetch_fields()
        .await
        .map_err(super::at(SessionStep::FetchFields {
            field_set: validated.field_set.clone(),
        }))?;

    let entries: Vec<FieldEntry> = field_choices(&fields)
        .into_iter()
        .enumerate()
        .map(|(i, choice)| FieldEntry { seq: i + 1, choice })
        .collect();

    let out = output::render_list(global.output, &entries, |entry| FieldRow {
        seq: entry.seq,
        id: entry.choice.id.clone(),
        name: entry.choice.label.clone(),
    })?;
    output::print_output(&out);
    Ok(())
}
