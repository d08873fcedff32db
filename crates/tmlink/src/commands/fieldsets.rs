//! `tmlink fieldsets`: list the field sets a controller offers.

use serde::Serialize;
use tabled::Tabled;

use tmlink_core::session::client::FieldSetResource;

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FieldSetInfo {
    id: u32,
    name: String,
    selected: bool,
}

#[derive(Tabled)]
struct FieldSetRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Selected")]
    selected: &'static str,
}

pub async fn handle(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let (validated, field_sets) = super::list_field_sets(resolved).await?;

    let infos: Vec<FieldSetInfo> = field_sets
        .iter()
        .map(|fs| FieldSetInfo {
            id: fs.id(),
            name: fs.name().to_owned(),
            selected: fs.name() == validated.field_set,
        })
        .collect();

    let out = output::render_list(global.output, &infos, |info| FieldSetRow {
        id: info.id,
        name: info.name.clone(),
        selected: if info.selected { "*" } else { "" },
    })?;
    output::print_output(&out);
    Ok(())
}
