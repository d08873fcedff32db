//! `tmlink displays`: the audience display modes a field set accepts.

use tabled::Tabled;

use tmlink_core::Choice;
use tmlink_core::feedback::display_choices;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DisplayRow {
    #[tabled(rename = "Mode")]
    id: String,
    #[tabled(rename = "Shows")]
    label: String,
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.output, &display_choices(), |choice: &Choice| {
        DisplayRow {
            id: choice.id.clone(),
            label: choice.label.clone(),
        }
    })?;
    output::print_output(&out);
    Ok(())
}
