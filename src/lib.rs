#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cmdgraph: build command-line programs from a graph of typed argument
//! nodes.
//!
//! One graph definition drives three interpretations of the same input:
//! execution (values into [`Data`], side effects deferred until the walk
//! succeeds), shell completion, and usage documentation.
//!
//! ```no_run
//! use cmdgraph::{Argument, BoolFlag, FlagProcessor, Settings, StdOutput, serial};
//!
//! let flags = FlagProcessor::new(vec![Box::new(BoolFlag::new("loud", Some('l'), "Shout"))])?;
//! let root = serial![flags, Argument::<String>::new("name", "Who to greet")];
//! cmdgraph::runner::run(root.as_ref(), &["-l", "world"], &mut StdOutput, &Settings::default())?;
//! # Ok::<(), cmdgraph::Error>(())
//! ```

pub mod args;
pub mod engine;
pub mod flags;
pub mod runner;
pub mod settings;

pub use args::{Argument, MapArg, Transformer, Validator};
pub use engine::{
    BranchNode, BufferedOutput, Completer, Completion, Data, DeferredExecutor, Description,
    DiscardOutput, Error, ExecutableLines, ExecuteData, FunctionWrap, Node, Output, Processor,
    Result, SimpleCompleter, SimpleNode, SimpleProcessor, StdOutput, TokenStream, Usage,
    serial_nodes, serial_nodes_to,
};
pub use flags::{BoolFlag, BoolValuesFlag, Flag, FlagInterface, FlagProcessor, ItemizedListFlag};
pub use runner::Outcome;
pub use settings::Settings;
