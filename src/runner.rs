/// Top-level entry points: run a graph against a command line, complete a
/// shell comp line, or document a graph.
use crate::engine::{
    Data, Error, ExecuteData, Node, Output, Result, TokenStream, Usage, complete_walk,
    execute_walk, usage_walk,
};
use crate::settings::Settings;

/// What a successful execution leaves behind for the caller.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Every value stored during the traversal.
    pub data: Data,
    /// Literal lines for the calling shell to run.
    pub executable: Vec<String>,
    /// Whether `executable` should be wrapped in a shell function.
    pub function_wrap: bool,
}

/// Execute `root` over `args`, then run the deferred executors.
///
/// Executors only run when the whole traversal succeeded.
///
/// # Errors
///
/// Returns the first traversal error, or the first executor error.
pub fn execute<S: AsRef<str>>(
    root: &dyn Node,
    args: &[S],
    output: &mut dyn Output,
) -> Result<Outcome> {
    let mut input = TokenStream::new(args.iter().map(AsRef::as_ref));
    let mut data = Data::new();
    let mut exec = ExecuteData::new();
    execute_walk(root, &mut input, output, &mut data, &mut exec)?;
    exec.run_executors(output, &data)?;
    Ok(Outcome {
        data,
        executable: std::mem::take(&mut exec.executable),
        function_wrap: exec.function_wrap,
    })
}

/// Like [`execute`], but reports a failure to `output` before returning it.
///
/// # Errors
///
/// Returns the same error [`execute`] would.
pub fn run<S: AsRef<str>>(
    root: &dyn Node,
    args: &[S],
    output: &mut dyn Output,
    settings: &Settings,
) -> Result<Outcome> {
    execute(root, args, output).inspect_err(|err| report_error(root, err, output, settings))
}

/// Write `err` to the error stream, followed by the full usage of `root` when
/// the error is a usage error.
pub fn report_error(root: &dyn Node, err: &Error, output: &mut dyn Output, settings: &Settings) {
    output.error(err);
    if !err.is_usage() {
        return;
    }
    match usage::<&str>(root, &[]) {
        Ok(doc) => {
            output.stderr("");
            output.stderr("======= Command Usage =======");
            for line in doc.render(&settings.usage).lines() {
                output.stderr(line);
            }
        }
        Err(usage_err) => {
            tracing::warn!(error = %usage_err, "failed to build usage after error");
        }
    }
}

/// Suggestions for the last token of a shell completion line.
///
/// The first token of `comp_line` is the program name and is dropped.
///
/// # Errors
///
/// Returns an error when the graph cannot be walked over the line.
pub fn autocomplete(root: &dyn Node, comp_line: &str, settings: &Settings) -> Result<Vec<String>> {
    let mut input = TokenStream::from_comp_line(comp_line);
    input.pop();
    let mut data = Data::new();
    let suggestions = complete_walk(root, &mut input, &mut data)?
        .map(|completion| completion.process(&settings.completion))
        .unwrap_or_default();
    tracing::debug!(count = suggestions.len(), "autocomplete finished");
    Ok(suggestions)
}

/// Document `root`, treating `args` as tokens already given.
///
/// # Errors
///
/// Returns an error when usage cannot be determined (for example an invalid
/// branch display order).
pub fn usage<S: AsRef<str>>(root: &dyn Node, args: &[S]) -> Result<Usage> {
    let mut input = TokenStream::new(args.iter().map(AsRef::as_ref));
    let mut data = Data::new();
    let mut doc = Usage::new();
    usage_walk(root, &mut input, &mut data, &mut doc)?;
    doc.check_consistency()?;
    Ok(doc)
}
