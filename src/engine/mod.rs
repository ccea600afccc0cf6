/// The traversal engine: token stream, processors and nodes, and the three
/// walks (execute, complete, usage) over a node graph.
pub mod branch;
pub mod comp_line;
pub mod complete;
pub mod data;
pub mod errors;
pub mod output;
pub mod processor;
pub mod serial;
pub mod stream;
pub mod traverse;
pub mod usage;

pub use branch::BranchNode;
pub use comp_line::split_comp_line;
pub use complete::{Completer, Completion, SimpleCompleter};
pub use data::Data;
pub use errors::{
    Error, Result, is_branching, is_extra_args, is_not_enough_args, is_usage, is_validation,
};
pub use output::{BufferedOutput, DiscardOutput, Output, StdOutput};
pub use processor::{ExecuteData, Executor, Node, Processor};
pub use serial::{
    DeferredExecutor, Description, ExecutableLines, FunctionWrap, SimpleNode, SimpleProcessor,
    serial_nodes, serial_nodes_to,
};
pub use stream::{Breaker, SnapshotId, TokenStream};
pub use traverse::{complete_walk, execute_walk, usage_walk};
pub use usage::{BRANCH_SYMBOL, Usage};
