/// `complete` command: suggestions for a shell completion line.
use cmdgraph::runner;
use cmdgraph::{Node, Result};

use crate::cli::OutputCtx;
use crate::cli::args::CompleteArgs;
use crate::cli::output::write_completions;
use crate::types::CompleteOutput;

/// Run `cmdgraph complete`.
///
/// # Errors
///
/// Returns the error that stopped the completion walk.
pub fn run(args: &CompleteArgs, root: &dyn Node, ctx: &OutputCtx) -> Result<()> {
    let suggestions = runner::autocomplete(root, &args.line, &ctx.settings)?;
    write_completions(
        &CompleteOutput {
            line: args.line.clone(),
            suggestions,
        },
        ctx,
    );
    Ok(())
}
