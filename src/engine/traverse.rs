/// The three traversal loops: execute, complete and usage.
///
/// Each walk is a loop over node edges rather than recursion, so arbitrarily
/// long serial chains do not grow the stack.
use super::complete::Completion;
use super::data::Data;
use super::errors::{Error, Result};
use super::output::Output;
use super::processor::{ExecuteData, Node};
use super::stream::TokenStream;
use super::usage::Usage;

/// Execute `root` and everything reachable through `next`.
///
/// # Errors
///
/// Returns the first processor or edge error, or `Error::ExtraArgs` when the
/// graph is exhausted before the stream is.
pub fn execute_walk(
    root: &dyn Node,
    input: &mut TokenStream,
    output: &mut dyn Output,
    data: &mut Data,
    exec: &mut ExecuteData,
) -> Result<()> {
    tracing::debug!(tokens = input.len(), "execute traversal start");
    let mut current = Some(root);
    let mut visited = 0;
    while let Some(node) = current {
        visited += 1;
        node.execute(input, output, data, exec)?;
        current = node.next(input, data)?;
    }
    if !input.fully_processed() {
        let remaining = input.remaining();
        tracing::debug!(?remaining, node = visited, "execute traversal left extra args");
        return Err(Error::ExtraArgs {
            remaining,
            node: visited,
        });
    }
    tracing::debug!(executors = exec.executor_count(), "execute traversal done");
    Ok(())
}

/// Walk like [`execute_walk`] but stop at the first node that produces a
/// completion. Never produces side effects.
///
/// # Errors
///
/// Returns the first processor or edge error.
pub fn complete_walk(
    root: &dyn Node,
    input: &mut TokenStream,
    data: &mut Data,
) -> Result<Option<Completion>> {
    tracing::debug!(tokens = input.len(), "complete traversal start");
    let mut current = Some(root);
    while let Some(node) = current {
        if let Some(completion) = node.complete(input, data)? {
            tracing::debug!(
                suggestions = completion.suggestions.len(),
                "complete traversal produced suggestions"
            );
            return Ok(Some(completion));
        }
        current = node.next(input, data)?;
    }
    Ok(None)
}

/// Document `root` and everything reachable through `usage_next`.
///
/// # Errors
///
/// Returns the first processor or edge error.
pub fn usage_walk(
    root: &dyn Node,
    input: &mut TokenStream,
    data: &mut Data,
    usage: &mut Usage,
) -> Result<()> {
    let mut current = Some(root);
    while let Some(node) = current {
        node.usage(input, data, usage)?;
        current = node.usage_next(input, data)?;
    }
    Ok(())
}
