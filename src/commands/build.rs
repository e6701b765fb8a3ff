//! Build command handler - Build or refresh the database

use std::sync::Arc;

use serde_json::json;

use crate::build::BuildCoordinator;
use crate::cli::OutputFormat;
use crate::commands::{to_json, CommandContext};
use crate::error::Result;
use crate::host::StderrStatus;

/// Run the build command
pub async fn run_build(ctx: &CommandContext) -> Result<String> {
    let engine = Arc::new(ctx.engine());
    let builder = BuildCoordinator::new(Arc::clone(&engine), Arc::new(StderrStatus));
    let output = builder.build(&ctx.root).await?;

    match ctx.format {
        OutputFormat::Json => Ok(to_json(&json!({
            "command": engine.last_build_command(),
            "database": ctx.config.database_path(&ctx.root),
            "output": output,
        }))),
        OutputFormat::Text => {
            let mut out = String::new();
            if ctx.verbose {
                if let Some(command) = engine.last_build_command() {
                    out.push_str(&format!("$ {}\n", command));
                }
            }
            if !output.is_empty() {
                out.push_str(&output);
                out.push('\n');
            }
            Ok(out)
        }
    }
}
