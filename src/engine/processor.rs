/// The `Processor` and `Node` roles, and the execute accumulator.
use std::fmt;

use super::complete::Completion;
use super::data::Data;
use super::errors::Result;
use super::output::Output;
use super::stream::TokenStream;
use super::usage::Usage;

/// A unit of argument handling, interpreted three ways.
///
/// Leaves that only care about one interpretation implement the others as
/// no-ops, so one graph definition serves execution, completion and usage.
pub trait Processor {
    /// Consume tokens and record values and side effects.
    ///
    /// # Errors
    ///
    /// Returns a classified [`Error`](super::errors::Error) when the input
    /// does not satisfy this processor.
    fn execute(
        &self,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()>;

    /// Consume tokens; return suggestions if this processor owns the token
    /// being completed.
    ///
    /// # Errors
    ///
    /// Returns an error when completion cannot proceed.
    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>>;

    /// Describe this processor in `usage`, consuming any tokens already given.
    ///
    /// # Errors
    ///
    /// Returns an error when usage cannot be determined.
    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()>;
}

/// A processor plus the edges leaving it.
pub trait Node: Processor {
    /// The edge followed during execution and completion.
    ///
    /// # Errors
    ///
    /// Returns an error when no edge matches the input.
    fn next(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<&dyn Node>>;

    /// The edge followed when documenting usage.
    ///
    /// # Errors
    ///
    /// Returns an error when usage of the next node cannot be determined.
    fn usage_next(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<&dyn Node>>;
}

/// A callback run after a traversal succeeds.
pub type Executor = Box<dyn FnOnce(&mut dyn Output, &Data) -> Result<()>>;

/// Side effects discovered during an execute traversal.
///
/// Consumed by the caller only after the traversal succeeded.
#[derive(Default)]
pub struct ExecuteData {
    executors: Vec<Executor>,
    /// Literal lines for the calling shell to run.
    pub executable: Vec<String>,
    /// Whether the lines should be wrapped in a shell function.
    pub function_wrap: bool,
}

impl fmt::Debug for ExecuteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteData")
            .field("executors", &self.executors.len())
            .field("executable", &self.executable)
            .field("function_wrap", &self.function_wrap)
            .finish()
    }
}

impl ExecuteData {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `f` until the traversal succeeds.
    pub fn add_executor(
        &mut self,
        f: impl FnOnce(&mut dyn Output, &Data) -> Result<()> + 'static,
    ) {
        self.executors.push(Box::new(f));
    }

    /// Number of deferred executors.
    #[must_use]
    pub fn executor_count(&self) -> usize {
        self.executors.len()
    }

    /// Run deferred executors in registration order, stopping at the first
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first executor error.
    pub fn run_executors(&mut self, output: &mut dyn Output, data: &Data) -> Result<()> {
        for executor in self.executors.drain(..) {
            executor(output, data)?;
        }
        Ok(())
    }
}
