/// `run` command: execute the graph over the given tokens.
use cmdgraph::runner;
use cmdgraph::{BufferedOutput, Node, Result, StdOutput};

use crate::cli::{OutputCtx, OutputFormat};
use crate::cli::args::RunArgs;
use crate::cli::output::write_run;
use crate::types::RunOutput;

/// Run `cmdgraph run`.
///
/// Text output streams lines as the graph writes them; the other formats
/// buffer them into one document.
///
/// # Errors
///
/// Returns the traversal or executor error.
pub fn run(args: &RunArgs, root: &dyn Node, ctx: &OutputCtx) -> Result<()> {
    tracing::debug!(args = ?args.args, "running graph");
    if ctx.is_json() || ctx.format == OutputFormat::Table {
        let mut out = BufferedOutput::new();
        let outcome = runner::execute(root, &args.args, &mut out)?;
        write_run(&RunOutput::new(outcome, out.stdout, out.stderr), ctx);
    } else {
        let outcome = runner::execute(root, &args.args, &mut StdOutput)?;
        write_run(&RunOutput::new(outcome, Vec::new(), Vec::new()), ctx);
    }
    Ok(())
}
