//! Calls command handler - Print callers or callees of a function

use crate::cli::{CallsArgs, OutputFormat};
use crate::commands::{to_json, CommandContext};
use crate::error::Result;
use crate::kind::{QueryKind, QuerySpec};
use crate::presentation::call_hierarchy_items;

/// Run the calls command
pub async fn run_calls(args: &CallsArgs, ctx: &CommandContext) -> Result<String> {
    let kind = if args.incoming {
        QueryKind::Caller
    } else {
        QueryKind::Callee
    };

    let engine = ctx.engine();
    let settled = engine
        .query(QuerySpec::new(kind, args.name.clone()), &ctx.root)
        .await?;
    let calls = call_hierarchy_items(&settled.sorted_items(), &ctx.root);

    match ctx.format {
        OutputFormat::Json => Ok(to_json(&calls)),
        OutputFormat::Text => {
            let direction = if args.incoming { "calling" } else { "called by" };
            let mut output = format!("functions {} {}: {}\n", direction, args.name, calls.len());
            for call in &calls {
                output.push_str(&format!("  {} {}\n", call.name, call.detail.trim_end()));
            }
            Ok(output)
        }
    }
}
