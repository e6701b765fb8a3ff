//! Config command handler - Show or initialize the configuration file

use crate::cli::{ConfigArgs, ConfigOperation, OutputFormat};
use crate::commands::{to_json, CommandContext};
use crate::config::NavConfig;
use crate::error::{NavError, Result};

/// Run the config command
pub fn run_config(args: &ConfigArgs, ctx: &CommandContext) -> Result<String> {
    match &args.operation {
        ConfigOperation::Show => run_show(ctx),
        ConfigOperation::Init { force } => run_init(*force, ctx),
    }
}

fn run_show(ctx: &CommandContext) -> Result<String> {
    match ctx.format {
        OutputFormat::Json => Ok(to_json(&ctx.config)),
        OutputFormat::Text => {
            let body = toml::to_string_pretty(&ctx.config).map_err(|e| NavError::Config {
                message: format!("Failed to serialize config: {}", e),
            })?;
            let source = match &ctx.config_path {
                Some(path) if path.exists() => path.display().to_string(),
                _ => "defaults".to_string(),
            };
            let indexer = match ctx.config.locate_indexer() {
                Some(path) => path.display().to_string(),
                None => format!("{} (not found on PATH)", ctx.config.indexer),
            };
            Ok(format!(
                "# source: {}\n# indexer: {}\n{}",
                source, indexer, body
            ))
        }
    }
}

fn run_init(force: bool, ctx: &CommandContext) -> Result<String> {
    let path = ctx.config_path.clone().ok_or_else(|| NavError::Config {
        message: "no configuration directory; pass --config".to_string(),
    })?;

    if path.exists() && !force {
        return Err(NavError::Config {
            message: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }

    NavConfig::default().save_to(&path)?;
    Ok(format!("Wrote {}\n", path.display()))
}
