/// Serial composition and the pass-through processors.
///
/// A serial chain is a list of single-processor nodes, each pointing at the
/// next. Pass-through processors only act in the traversal mode they care
/// about and are no-ops in the others.
use std::fmt;
use std::rc::Rc;

use super::complete::Completion;
use super::data::Data;
use super::errors::Result;
use super::output::Output;
use super::processor::{ExecuteData, Node, Processor};
use super::stream::TokenStream;
use super::usage::Usage;

/// A node wrapping one processor and at most one outgoing edge.
pub struct SimpleNode {
    processor: Box<dyn Processor>,
    next: Option<Box<dyn Node>>,
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("has_next", &self.next.is_some())
            .finish_non_exhaustive()
    }
}

impl SimpleNode {
    /// Node running `processor` with no outgoing edge.
    #[must_use]
    pub fn new(processor: impl Processor + 'static) -> Self {
        Self {
            processor: Box::new(processor),
            next: None,
        }
    }

    /// Node running an already boxed processor, then following `next`.
    #[must_use]
    pub fn with_next(processor: Box<dyn Processor>, next: Option<Box<dyn Node>>) -> Self {
        Self { processor, next }
    }
}

impl Processor for SimpleNode {
    fn execute(
        &self,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        self.processor.execute(input, output, data, exec)
    }

    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        self.processor.complete(input, data)
    }

    fn usage(&self, input: &mut TokenStream, data: &mut Data, usage: &mut Usage) -> Result<()> {
        self.processor.usage(input, data, usage)
    }
}

impl Node for SimpleNode {
    fn next(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<&dyn Node>> {
        Ok(self.next.as_deref())
    }

    fn usage_next(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<&dyn Node>> {
        Ok(self.next.as_deref())
    }
}

/// Chain `processors` into nodes, in order.
///
/// An empty list yields a single node that does nothing.
#[must_use]
pub fn serial_nodes(processors: Vec<Box<dyn Processor>>) -> Box<dyn Node> {
    let mut iter = processors.into_iter().rev();
    let Some(last) = iter.next() else {
        return Box::new(SimpleNode::new(Noop));
    };
    let tail: Box<dyn Node> = Box::new(SimpleNode::with_next(last, None));
    iter.fold(tail, |next, processor| {
        Box::new(SimpleNode::with_next(processor, Some(next)))
    })
}

/// Chain `processors` into nodes that end by following `tail`.
#[must_use]
pub fn serial_nodes_to(tail: Box<dyn Node>, processors: Vec<Box<dyn Processor>>) -> Box<dyn Node> {
    processors.into_iter().rev().fold(tail, |next, processor| {
        Box::new(SimpleNode::with_next(processor, Some(next)))
    })
}

/// Build a serial chain from processor expressions.
///
/// `serial![a, b, c]` chains the processors; `serial![a, b => tail]` chains
/// them and then continues into the node `tail`.
#[macro_export]
macro_rules! serial {
    ($($processor:expr),+ => $tail:expr) => {
        $crate::engine::serial_nodes_to(
            $tail,
            vec![$(Box::new($processor) as Box<dyn $crate::engine::Processor>),+],
        )
    };
    ($($processor:expr),* $(,)?) => {
        $crate::engine::serial_nodes(
            vec![$(Box::new($processor) as Box<dyn $crate::engine::Processor>),*],
        )
    };
}

/// Does nothing in every mode.
#[derive(Debug, Clone, Copy, Default)]
struct Noop;

impl Processor for Noop {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        _data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

// --- Pass-through processors ---

/// Adds a description line to usage output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

impl Description {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Processor for Description {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        _data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, usage: &mut Usage) -> Result<()> {
        usage.set_description(self.0.clone());
        Ok(())
    }
}

type ExecutorFn = dyn Fn(&mut dyn Output, &Data) -> Result<()>;

/// Registers a callback that runs only after the whole traversal succeeds.
#[derive(Clone)]
pub struct DeferredExecutor {
    f: Rc<ExecutorFn>,
}

impl fmt::Debug for DeferredExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredExecutor").finish_non_exhaustive()
    }
}

impl DeferredExecutor {
    #[must_use]
    pub fn new(f: impl Fn(&mut dyn Output, &Data) -> Result<()> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }
}

impl Processor for DeferredExecutor {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        _data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        let f = Rc::clone(&self.f);
        exec.add_executor(move |output, data| f(output, data));
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

/// Asks the caller to wrap the executable lines in a shell function.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionWrap;

impl Processor for FunctionWrap {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        _data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        exec.function_wrap = true;
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

type LinesFn = dyn Fn(&Data) -> Result<Vec<String>>;

/// Appends literal lines for the calling shell to run.
#[derive(Clone)]
pub struct ExecutableLines {
    f: Rc<LinesFn>,
}

impl fmt::Debug for ExecutableLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableLines").finish_non_exhaustive()
    }
}

impl ExecutableLines {
    /// Lines computed from the data gathered so far.
    #[must_use]
    pub fn new(f: impl Fn(&Data) -> Result<Vec<String>> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// A fixed list of lines.
    #[must_use]
    pub fn fixed<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self::new(move |_| Ok(lines.clone()))
    }
}

impl Processor for ExecutableLines {
    fn execute(
        &self,
        _input: &mut TokenStream,
        _output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        let lines = (self.f)(data)?;
        exec.executable.extend(lines);
        Ok(())
    }

    fn complete(&self, _input: &mut TokenStream, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

type ExecuteFn = dyn Fn(&mut TokenStream, &mut dyn Output, &mut Data, &mut ExecuteData) -> Result<()>;
type CompleteFn = dyn Fn(&mut TokenStream, &mut Data) -> Result<Option<Completion>>;

/// A processor backed by closures. Usage is a no-op.
pub struct SimpleProcessor {
    execute: Box<ExecuteFn>,
    complete: Option<Box<CompleteFn>>,
}

impl fmt::Debug for SimpleProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleProcessor")
            .field("has_complete", &self.complete.is_some())
            .finish_non_exhaustive()
    }
}

impl SimpleProcessor {
    #[must_use]
    pub fn new(
        execute: impl Fn(&mut TokenStream, &mut dyn Output, &mut Data, &mut ExecuteData) -> Result<()>
        + 'static,
    ) -> Self {
        Self {
            execute: Box::new(execute),
            complete: None,
        }
    }

    /// Also handle completion.
    #[must_use]
    pub fn with_complete(
        mut self,
        complete: impl Fn(&mut TokenStream, &mut Data) -> Result<Option<Completion>> + 'static,
    ) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }
}

impl Processor for SimpleProcessor {
    fn execute(
        &self,
        input: &mut TokenStream,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        (self.execute)(input, output, data, exec)
    }

    fn complete(&self, input: &mut TokenStream, data: &mut Data) -> Result<Option<Completion>> {
        match &self.complete {
            Some(complete) => complete(input, data),
            None => Ok(None),
        }
    }

    fn usage(&self, _input: &mut TokenStream, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}
