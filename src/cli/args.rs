/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// cmdgraph — run, complete and document the demo notes grammar.
#[derive(Debug, Parser)]
#[command(
    name = "cmdgraph",
    about = "Drive a command graph: execute it, complete a shell line, or print its usage",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output format. Auto-detects: text when TTY, json when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Settings file (TOML) for completion and usage rendering.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log traversal decisions to stderr (same as CMDGRAPH_LOG=debug).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: text when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Plain lines, exactly as the graph wrote them.
    Text,
    /// Aligned table with headers (human-readable).
    Table,
    /// JSON object (pretty-printed).
    Json,
    /// Compact single-line JSON.
    Compact,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute the notes grammar over ARGS.
    Run(RunArgs),
    /// Print suggestions for a shell completion line.
    Complete(CompleteArgs),
    /// Print the usage of the notes grammar.
    Usage(UsageArgs),
}

/// Arguments for `cmdgraph run`.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Tokens handed to the graph (put them after `--`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Arguments for `cmdgraph complete`.
#[derive(Debug, Parser)]
pub struct CompleteArgs {
    /// The whole line being completed, program name first
    /// (e.g. "notes add -t ").
    #[arg(value_name = "LINE")]
    pub line: String,
}

/// Arguments for `cmdgraph usage`.
#[derive(Debug, Parser)]
pub struct UsageArgs {
    /// Tokens already given; documented nodes start after them.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}
