/// Shared serializable output types for all commands.
///
/// These types are what gets written to stdout (or stderr for errors) as
/// JSON. They are decoupled from the library's `Data` and `Usage` types.
use std::collections::BTreeMap;

use cmdgraph::{Error, Outcome, Usage};
use serde::Serialize;

/// Result of `cmdgraph run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// Always `true`.
    pub ok: bool,
    /// Lines the graph wrote to its standard stream.
    pub stdout: Vec<String>,
    /// Lines the graph wrote to its error stream.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stderr: Vec<String>,
    /// Every stored value, rendered with `Debug`.
    pub data: BTreeMap<String, String>,
    /// Literal lines for the calling shell.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executable: Vec<String>,
    /// Whether `executable` should be wrapped in a shell function.
    pub function_wrap: bool,
}

impl RunOutput {
    /// Construct from a finished run and the lines it wrote.
    #[must_use]
    pub fn new(outcome: Outcome, stdout: Vec<String>, stderr: Vec<String>) -> Self {
        let data = outcome
            .data
            .keys()
            .filter_map(|key| Some((key.to_owned(), outcome.data.display(key)?)))
            .collect();
        Self {
            ok: true,
            stdout,
            stderr,
            data,
            executable: outcome.executable,
            function_wrap: outcome.function_wrap,
        }
    }
}

/// Result of `cmdgraph complete`.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteOutput {
    /// The line that was completed.
    pub line: String,
    /// Suggestions, in display order.
    pub suggestions: Vec<String>,
}

/// Result of `cmdgraph usage`.
#[derive(Debug, Clone, Serialize)]
pub struct UsageOutput<'a> {
    /// The structured usage document.
    pub usage: &'a Usage,
    /// The same document rendered as text.
    pub text: String,
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Valid choices (for branching errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
    /// Rendered usage, present for usage errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl ErrorOutput {
    /// Construct from a graph error, attaching `usage` when the error calls
    /// for it.
    #[must_use]
    pub fn from_error(err: &Error, usage: Option<String>) -> Self {
        let candidates = match err.root() {
            Error::Branching { choices, .. } => Some(choices.clone()),
            _ => None,
        };
        Self {
            ok: false,
            error: ErrorDetail {
                code: error_code(err).to_owned(),
                message: err.to_string(),
                candidates,
                usage: usage.filter(|_| err.is_usage()),
            },
        }
    }

    /// Construct from a failure outside the graph (settings, graph setup).
    #[must_use]
    pub fn from_message(code: &str, message: String) -> Self {
        Self {
            ok: false,
            error: ErrorDetail {
                code: code.to_owned(),
                message,
                candidates: None,
                usage: None,
            },
        }
    }
}

fn error_code(err: &Error) -> &'static str {
    match err.root() {
        Error::NotEnoughArgs { .. } => "not_enough_args",
        Error::ExtraArgs { .. } => "extra_args",
        Error::Validation { .. } => "validation",
        Error::Branching { .. } => "branching",
        Error::AmbiguousMultiFlag { .. } => "ambiguous_multi_flag",
        Error::FlagAlreadySet { .. } => "flag_already_set",
        Error::Conversion { .. } => "conversion",
        Error::InvalidGraph(_) => "invalid_graph",
        Error::Annotated { .. } | Error::Usage(_) | Error::Other(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branching_error_lists_candidates() {
        let err = Error::Branching {
            token: Some("x".to_owned()),
            choices: vec!["a".to_owned(), "b".to_owned()],
        };
        let out = ErrorOutput::from_error(&err, Some("USAGE".to_owned()));
        assert_eq!(out.error.code, "branching");
        assert_eq!(out.error.candidates.as_deref(), Some(&["a".to_owned(), "b".to_owned()][..]));
        assert_eq!(out.error.usage.as_deref(), Some("USAGE"));
    }

    #[test]
    fn test_usage_dropped_for_non_usage_errors() {
        let err = Error::msg("boom");
        let out = ErrorOutput::from_error(&err, Some("USAGE".to_owned()));
        assert_eq!(out.error.code, "error");
        assert!(out.error.usage.is_none());
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":{"code":"error","message":"boom"}}"#);
    }
}
