/// Output formatting: text, table and JSON modes. TTY detection.
use std::io::{IsTerminal, Write};

use cmdgraph::runner;
use cmdgraph::{Error, Node, Settings, StdOutput, Usage};
use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::types::{CompleteOutput, ErrorOutput, RunOutput, UsageOutput};

/// Name of the shell function wrapping executable lines.
const WRAP_FUNCTION: &str = "_cmdgraph_exec";

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub settings: Settings,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, settings: Settings) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            settings,
        }
    }

    /// Whether the resolved format is one of the JSON variants.
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Compact)
    }
}

// --- Run ---

/// Write the result of a run to stdout.
pub fn write_run(result: &RunOutput, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Compact => print_compact_json(result),
        OutputFormat::Table => write_run_table(result),
        OutputFormat::Text | OutputFormat::Auto => {
            for line in &result.stdout {
                println!("{line}");
            }
            for line in &result.stderr {
                eprintln!("{line}");
            }
            print_executable(&result.executable, result.function_wrap);
        }
    }
}

fn write_run_table(result: &RunOutput) {
    for line in &result.stdout {
        println!("{line}");
    }
    if !result.data.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["KEY", "VALUE"]);
        for (key, value) in &result.data {
            table.add_row([key.as_str(), value.as_str()]);
        }
        println!("{table}");
    }
    print_executable(&result.executable, result.function_wrap);
}

fn print_executable(lines: &[String], function_wrap: bool) {
    if lines.is_empty() {
        return;
    }
    if function_wrap {
        println!("function {WRAP_FUNCTION} {{");
        for line in lines {
            println!("  {line}");
        }
        println!("}}");
        println!("{WRAP_FUNCTION}");
    } else {
        for line in lines {
            println!("{line}");
        }
    }
}

// --- Complete ---

/// Write completion suggestions to stdout.
pub fn write_completions(result: &CompleteOutput, ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Compact => print_compact_json(result),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(["SUGGESTION"]);
            for s in &result.suggestions {
                table.add_row([s.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Text | OutputFormat::Auto => {
            for s in &result.suggestions {
                println!("{s}");
            }
        }
    }
}

// --- Usage ---

/// Write a usage document to stdout.
pub fn write_usage(usage: &Usage, ctx: &OutputCtx) {
    let text = usage.render(&ctx.settings.usage);
    match ctx.format {
        OutputFormat::Json => print_json(&UsageOutput { usage, text }),
        OutputFormat::Compact => print_compact_json(&UsageOutput { usage, text }),
        OutputFormat::Table => write_usage_tables(usage, ctx),
        OutputFormat::Text | OutputFormat::Auto => println!("{text}"),
    }
}

fn write_usage_tables(usage: &Usage, ctx: &OutputCtx) {
    if let Some(description) = usage.description() {
        println!("{description}");
    }
    let head: Vec<&str> = usage
        .tokens()
        .iter()
        .chain(usage.flag_tokens())
        .map(String::as_str)
        .collect();
    if !head.is_empty() {
        println!("{}", head.join(" "));
    }

    if ctx.settings.usage.show_arguments && !usage.arguments().is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["ARGUMENT", "DESCRIPTION"]);
        for arg in usage.arguments() {
            table.add_row([arg.name.to_uppercase(), arg.description.clone()]);
        }
        println!("{table}");
    }

    if ctx.settings.usage.show_flags && !usage.flags().is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["FLAG", "SHORT", "DESCRIPTION"]);
        for flag in usage.flags() {
            table.add_row([
                Cell::new(format!("--{}", flag.name)),
                Cell::new(flag.short.map(|c| format!("-{c}")).unwrap_or_default()),
                Cell::new(&flag.description),
            ]);
        }
        println!("{table}");
    }

    if !usage.branches().is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["BRANCH", "USAGE", "DESCRIPTION"]);
        for branch in usage.branches() {
            let head: Vec<&str> = branch
                .usage
                .tokens()
                .iter()
                .chain(branch.usage.flag_tokens())
                .map(String::as_str)
                .collect();
            table.add_row([
                branch.names.join("|"),
                head.join(" "),
                branch.usage.description().unwrap_or_default().to_owned(),
            ]);
        }
        println!("{table}");
    }
}

// --- Error output ---

/// Report a graph error: JSON envelope on stderr in JSON modes, otherwise the
/// message followed by usage for usage errors.
pub fn write_error(root: &dyn Node, err: &Error, ctx: &OutputCtx) {
    if ctx.is_json() {
        let usage = err
            .is_usage()
            .then(|| runner::usage::<&str>(root, &[]).ok())
            .flatten()
            .map(|doc| doc.render(&ctx.settings.usage));
        write_error_output(&ErrorOutput::from_error(err, usage), ctx);
    } else {
        runner::report_error(root, err, &mut StdOutput, &ctx.settings);
    }
}

/// Write a structured error to stderr.
pub fn write_error_output(err: &ErrorOutput, ctx: &OutputCtx) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match ctx.format {
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        OutputFormat::Compact => {
            let s = serde_json::to_string(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        _ => {
            let _ = writeln!(out, "Error: {}", err.error.message);
            if let Some(candidates) = &err.error.candidates {
                let _ = writeln!(out, "  Candidates:");
                for c in candidates {
                    let _ = writeln!(out, "    {c}");
                }
            }
        }
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
