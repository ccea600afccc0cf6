/// `usage` command: document the graph.
use cmdgraph::runner;
use cmdgraph::{Node, Result};

use crate::cli::OutputCtx;
use crate::cli::args::UsageArgs;
use crate::cli::output::write_usage;

/// Run `cmdgraph usage`.
///
/// # Errors
///
/// Returns an error when the graph cannot be documented.
pub fn run(args: &UsageArgs, root: &dyn Node, ctx: &OutputCtx) -> Result<()> {
    let usage = runner::usage(root, &args.args)?;
    write_usage(&usage, ctx);
    Ok(())
}
