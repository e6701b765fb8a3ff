//! Query command handler - Run one query and print the resolved results

use std::path::Path;

use serde_json::json;

use crate::cli::{OutputFormat, QueryArgs};
use crate::commands::{to_json, CommandContext};
use crate::engine::SettledRun;
use crate::error::Result;
use crate::kind::QuerySpec;
use crate::presentation::{result_tree, ResultTree};
use crate::resolver::ResolvedItem;

/// Run the query command
pub async fn run_query(args: &QueryArgs, ctx: &CommandContext) -> Result<String> {
    let engine = ctx.engine();
    let spec = QuerySpec::new(args.kind, args.pattern.clone());
    let settled = engine.query(spec, &ctx.root).await?;

    if ctx.verbose {
        eprintln!(
            "{} hits, {} malformed lines, {} unreadable",
            settled.stats.hits, settled.stats.dropped_lines, settled.stats.dropped_items
        );
    }

    let items = settled.sorted_items();
    if args.tree {
        let tree = result_tree(&title(&settled), &items, &ctx.root);
        return Ok(match ctx.format {
            OutputFormat::Json => to_json(&tree),
            OutputFormat::Text => format_tree(&tree),
        });
    }

    Ok(match ctx.format {
        OutputFormat::Json => to_json(&json!({
            "kind": settled.spec.kind(),
            "pattern": settled.spec.pattern(),
            "stats": settled.stats,
            "items": items,
        })),
        OutputFormat::Text => format_items(&items, &ctx.root),
    })
}

fn title(settled: &SettledRun) -> String {
    format!("{} {}", settled.spec.kind(), settled.spec.pattern())
}

/// One `file:line:column: text` line per item, 1-based
pub fn format_items(items: &[ResolvedItem], root: &Path) -> String {
    let mut output = String::new();
    for item in items {
        output.push_str(&format!(
            "{}:{}:{}: {}\n",
            item.relative_path(root),
            item.line + 1,
            item.column + 1,
            item.line_text.trim_end()
        ));
    }
    output
}

/// Tree with a header, files and their indented results
pub fn format_tree(tree: &ResultTree) -> String {
    let mut output = String::new();
    output.push_str("═══════════════════════════════════════════\n");
    output.push_str(&format!("  {} ({} results)\n", tree.title, tree.len()));
    output.push_str("═══════════════════════════════════════════\n");

    for group in &tree.files {
        output.push_str(&format!("\n{}\n", group.path));
        for leaf in &group.children {
            output.push_str(&format!("  {}\n", leaf.label));
        }
    }
    output
}
