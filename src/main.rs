//! cscope-nav CLI entry point

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cscope_nav::cli::{Cli, Commands};
use cscope_nav::commands::{run_build, run_calls, run_config, run_query, run_watch, CommandContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

async fn run(cli: &Cli) -> cscope_nav::Result<String> {
    let ctx = CommandContext::from_cli(cli)?;

    let level = if ctx.verbose {
        "debug"
    } else {
        ctx.config.log_level.as_str()
    };
    if let Err(e) = init_tracing(level) {
        eprintln!("Warning: {:#}", e);
    }

    match &cli.command {
        Commands::Build => run_build(&ctx).await,
        Commands::Query(args) => run_query(args, &ctx).await,
        Commands::Calls(args) => run_calls(args, &ctx).await,
        Commands::Watch => run_watch(&ctx).await,
        Commands::Config(args) => run_config(args, &ctx),
    }
}

/// Log to stderr; `RUST_LOG` wins over the configured level
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive(
            format!("cscope_nav={}", level)
                .parse()
                .with_context(|| format!("invalid log_level {:?}", level))?,
        ),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(())
}
