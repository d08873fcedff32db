//! `tmlink watch`: run a session and print what it publishes until Ctrl-C.

use std::sync::Arc;

use tracing::info;

use tmlink_core::{Condition, SessionManager};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Resolved;
use crate::console::ConsoleSurface;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let conditions: Vec<Condition> = args
        .when_display
        .into_iter()
        .map(Condition::AudienceDisplayIs)
        .chain(args.when_field.into_iter().map(Condition::ActiveFieldIs))
        .collect();

    let surface = Arc::new(ConsoleSurface::new(
        global.output,
        output::should_color(global.color),
        conditions,
    ));
    let controller = resolved.controller();
    let (handle, task) = SessionManager::new(controller, surface, resolved.options).spawn();

    if let Err(e) = handle.start(resolved.settings).await {
        handle.stop().await;
        let _ = task.await;
        return Err(e.into());
    }

    tokio::signal::ctrl_c().await?;
    info!("interrupted, closing session");
    handle.stop().await;
    let _ = task.await;
    Ok(())
}
