//! Watch command handler - Rebuild the database on source changes

use std::sync::Arc;

use crate::build::BuildCoordinator;
use crate::commands::CommandContext;
use crate::error::Result;
use crate::host::StderrStatus;

/// Run the watch command until Ctrl-C
pub async fn run_watch(ctx: &CommandContext) -> Result<String> {
    let engine = Arc::new(ctx.engine());
    let builder = Arc::new(BuildCoordinator::new(engine, Arc::new(StderrStatus)));

    builder.ensure_fresh(&ctx.root).await?;
    let handle = builder.watch_and_rebuild(&ctx.root)?;
    eprintln!(
        "Watching {} under {} (Ctrl-C to stop)",
        handle.pattern(),
        ctx.root.display()
    );

    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok("Stopped watching.\n".to_string())
}
