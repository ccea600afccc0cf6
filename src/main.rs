#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cmdgraph — execute, complete and document the demo notes grammar.

mod cli;
mod commands;
mod demo;
mod types;

use clap::Parser;
use cmdgraph::Settings;
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputCtx, write_error, write_error_output};
use types::ErrorOutput;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "CMDGRAPH_LOG";

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let settings = match cli.config.as_deref().map(Settings::load).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            let ctx = OutputCtx::new(cli.output, cli.json, Settings::default());
            write_error_output(&ErrorOutput::from_message("settings", err.to_string()), &ctx);
            std::process::exit(1);
        }
    };
    let ctx = OutputCtx::new(cli.output, cli.json, settings);

    let root = match demo::build() {
        Ok(root) => root,
        Err(err) => {
            write_error_output(&ErrorOutput::from_error(&err, None), &ctx);
            std::process::exit(err.exit_code());
        }
    };

    if let Err(err) = commands::dispatch(&cli.command, root.as_ref(), &ctx) {
        write_error(root.as_ref(), &err, &ctx);
        std::process::exit(err.exit_code());
    }
}
