/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod complete;
pub mod run;
pub mod usage;

use cmdgraph::{Node, Result};

use crate::cli::OutputCtx;
use crate::cli::args::Command;

/// Dispatch a parsed `Command` to its handler over the graph `root`.
///
/// # Errors
///
/// Returns the graph error of the failed execution, completion or usage walk.
pub fn dispatch(command: &Command, root: &dyn Node, ctx: &OutputCtx) -> Result<()> {
    match command {
        Command::Run(args) => run::run(args, root, ctx),
        Command::Complete(args) => complete::run(args, root, ctx),
        Command::Usage(args) => usage::run(args, root, ctx),
    }
}
