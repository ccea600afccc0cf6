/// Classified errors produced while walking a node graph.
use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while executing, completing or documenting a graph.
///
/// Several variants double as control-flow signals: callers inspect them with
/// the classification predicates ([`Error::is_not_enough_args`] and friends)
/// to decide whether to retry, annotate or propagate.
#[derive(Debug, Error)]
pub enum Error {
    /// A typed argument (or a flag's value) could not reach its minimum arity.
    #[error(
        "Argument \"{name}\" requires at least {min} argument{}, got {got}",
        if *min == 1 { "" } else { "s" }
    )]
    NotEnoughArgs {
        /// Argument (or flag) name.
        name: String,
        /// Minimum number of tokens required.
        min: usize,
        /// Number of tokens actually obtained.
        got: usize,
    },

    /// Tokens remained after the graph was exhausted.
    #[error("Unprocessed extra args: [{}]", remaining.join(" "))]
    ExtraArgs {
        /// The unconsumed tokens, in order.
        remaining: Vec<String>,
        /// Position (1-based) in the walk of the node that stopped consuming.
        node: usize,
    },

    /// A validator rejected a value that was present.
    #[error("validation for \"{name}\" failed: [{validator}] {message}")]
    Validation {
        /// Argument name.
        name: String,
        /// Name of the validator that failed (e.g. `MinLength(3)`).
        validator: String,
        /// Reason given by the validator.
        message: String,
    },

    /// A branch token matched no branch or synonym and there is no default.
    #[error("Branching argument must be one of [{}]{}", choices.join(" "), got_suffix(token.as_deref()))]
    Branching {
        /// The token that was tried, if any remained.
        token: Option<String>,
        /// Canonical branch names that would have been accepted.
        choices: Vec<String>,
    },

    /// A short-flag bundle matched this processor's flags only partially,
    /// or contained a flag that cannot be combined.
    #[error("Unknown or ambiguous multi-flag \"{token}\": {reason}")]
    AmbiguousMultiFlag {
        /// The bundle token (e.g. `-nx`).
        token: String,
        /// Why the bundle was rejected.
        reason: String,
    },

    /// A flag without the allows-multiple capability was provided twice.
    #[error("Flag \"{name}\" has already been set")]
    FlagAlreadySet {
        /// Flag name (without dashes).
        name: String,
    },

    /// A token could not be converted to the argument's value type.
    #[error("failed to convert argument \"{name}\": {message}")]
    Conversion {
        /// Argument name.
        name: String,
        /// Adapter error message.
        message: String,
    },

    /// The graph itself is malformed (duplicate flag, bad display order, ...).
    #[error("invalid command graph: {0}")]
    InvalidGraph(String),

    /// Another error with positional or branch context prepended.
    #[error("{prefix}: {source}")]
    Annotated {
        /// Context prefix.
        prefix: String,
        /// The wrapped error; its classification is preserved.
        source: Box<Error>,
    },

    /// Explicitly marks the wrapped error as one that should be followed by
    /// a usage block.
    #[error("{0}")]
    Usage(Box<Error>),

    /// Any other error raised by a processor's own logic.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn got_suffix(token: Option<&str>) -> String {
    token.map_or_else(String::new, |t| format!(", got \"{t}\""))
}

impl Error {
    /// Wrap `err` with a context prefix.
    #[must_use]
    pub fn annotate(prefix: impl Into<String>, err: Error) -> Self {
        Self::Annotated {
            prefix: prefix.into(),
            source: Box::new(err),
        }
    }

    /// Mark `err` as a usage error.
    #[must_use]
    pub fn usage(err: Error) -> Self {
        Self::Usage(Box::new(err))
    }

    /// Shorthand for a generic processor error with a message.
    #[must_use]
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self::Other(anyhow::anyhow!("{message}"))
    }

    /// The innermost classified error, looking through annotation layers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Annotated { source, .. } | Self::Usage(source) => source.root(),
            other => other,
        }
    }

    /// Whether a minimum arity could not be reached.
    #[must_use]
    pub fn is_not_enough_args(&self) -> bool {
        matches!(self.root(), Self::NotEnoughArgs { .. })
    }

    /// Whether unconsumed tokens remained.
    #[must_use]
    pub fn is_extra_args(&self) -> bool {
        matches!(self.root(), Self::ExtraArgs { .. })
    }

    /// Whether a validator rejected a present value.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation { .. })
    }

    /// Whether branch selection failed.
    #[must_use]
    pub fn is_branching(&self) -> bool {
        matches!(self.root(), Self::Branching { .. })
    }

    /// Whether a short-flag bundle was rejected.
    #[must_use]
    pub fn is_ambiguous_multi_flag(&self) -> bool {
        matches!(self.root(), Self::AmbiguousMultiFlag { .. })
    }

    /// Whether this error should be followed by a usage block.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        if self.has_usage_marker() {
            return true;
        }
        matches!(
            self.root(),
            Self::NotEnoughArgs { .. }
                | Self::ExtraArgs { .. }
                | Self::Branching { .. }
                | Self::AmbiguousMultiFlag { .. }
        )
    }

    fn has_usage_marker(&self) -> bool {
        match self {
            Self::Usage(_) => true,
            Self::Annotated { source, .. } => source.has_usage_marker(),
            _ => false,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() { 2 } else { 1 }
    }
}

/// Whether `err` is a Not-Enough-Args error.
#[must_use]
pub fn is_not_enough_args(err: &Error) -> bool {
    err.is_not_enough_args()
}

/// Whether `err` is an Extra-Args error.
#[must_use]
pub fn is_extra_args(err: &Error) -> bool {
    err.is_extra_args()
}

/// Whether `err` is a Validation error.
#[must_use]
pub fn is_validation(err: &Error) -> bool {
    err.is_validation()
}

/// Whether `err` should be followed by a usage block.
#[must_use]
pub fn is_usage(err: &Error) -> bool {
    err.is_usage()
}

/// Whether `err` is a Branching error.
#[must_use]
pub fn is_branching(err: &Error) -> bool {
    err.is_branching()
}
