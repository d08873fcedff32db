//! Command handlers, one module per subcommand.

pub mod action;
pub mod config_cmd;
pub mod displays;
pub mod fields;
pub mod fieldsets;
pub mod watch;

use clap::CommandFactory;

use tmlink_core::config::ValidatedSettings;
use tmlink_core::session::client::{ControllerClient, ControllerSession};
use tmlink_core::tm::TmFieldSet;
use tmlink_core::{CoreError, SessionError, SessionStep};

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        // No controller connection needed
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Displays => displays::handle(global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }

        // Everything else talks to the controller
        Command::Watch(args) => watch::handle(args, config::resolve(global)?, global).await,
        Command::Fieldsets => fieldsets::handle(&config::resolve(global)?, global).await,
        Command::Fields => fields::handle(&config::resolve(global)?, global).await,
        Command::Action(args) => action::handle(args, config::resolve(global)?, global).await,
    }
}

fn completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "tmlink", &mut std::io::stdout());
}

/// Attach the failing step to a controller error.
fn at(step: SessionStep) -> impl FnOnce(CoreError) -> CliError {
    move |source| SessionError::Transport { step, source }.into()
}

/// Authenticate and list field sets, outside of a session.
async fn list_field_sets(
    resolved: &Resolved,
) -> Result<(ValidatedSettings, Vec<TmFieldSet>), CliError> {
    let validated = resolved.settings.validate()?;
    let session = resolved
        .controller()
        .authenticate(&validated.credentials)
        .await
        .map_err(at(SessionStep::Authenticate))?;
    let field_sets = session
        .list_resources()
        .await
        .map_err(at(SessionStep::ListFieldSets))?;
    tracing::debug!(count = field_sets.len(), "listed field sets");
    Ok((validated, field_sets))
}
