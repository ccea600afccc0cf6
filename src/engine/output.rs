/// Line-oriented output sinks handed to processors and executors.
use std::io::Write;

use super::errors::Error;

/// Where processors and deferred executors write their output.
pub trait Output {
    /// Write one line to the standard stream.
    fn stdout(&mut self, line: &str);

    /// Write one line to the error stream.
    fn stderr(&mut self, line: &str);

    /// Prefix `err` with context while keeping its classification.
    fn annotate(&mut self, err: Error, prefix: &str) -> Error {
        Error::annotate(prefix, err)
    }

    /// Write an error's message to the error stream.
    fn error(&mut self, err: &Error) {
        self.stderr(&err.to_string());
    }
}

/// Writes straight to the process's stdout and stderr.
#[derive(Debug, Default)]
pub struct StdOutput;

impl Output for StdOutput {
    fn stdout(&mut self, line: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "{line}");
    }

    fn stderr(&mut self, line: &str) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let _ = writeln!(out, "{line}");
    }
}

/// Collects lines in memory. Used by tests and by JSON front ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedOutput {
    /// Lines written to stdout, in order.
    pub stdout: Vec<String>,
    /// Lines written to stderr, in order.
    pub stderr: Vec<String>,
}

impl BufferedOutput {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Output for BufferedOutput {
    fn stdout(&mut self, line: &str) {
        self.stdout.push(line.to_owned());
    }

    fn stderr(&mut self, line: &str) {
        self.stderr.push(line.to_owned());
    }
}

/// Drops everything. Used for dry scans where only data effects matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardOutput;

impl Output for DiscardOutput {
    fn stdout(&mut self, _line: &str) {}

    fn stderr(&mut self, _line: &str) {}
}
