//! Error types.
//!
//! Malformed or unfinished markdown is never an error: it is exactly what
//! the overlay masks. Errors are limited to bad configuration and misuse
//! of the streaming entry points.

/// Rejected token-series table or feeder configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("token series `{name}` has no matchers")]
    EmptySeries { name: String },

    #[error("matcher {index} of token series `{series}` can match the empty string")]
    EmptyMatch { series: String, index: usize },

    #[error("matcher {index} of token series `{series}` is not a valid pattern: {source}")]
    InvalidPattern {
        series: String,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("token series `{name}` is defined more than once")]
    DuplicateSeries { name: String },

    #[error("{count} token series exceed the limit of {limit}")]
    TooManySeries { count: usize, limit: usize },

    #[error("token series `{name}` has {count} matchers, the limit is {limit}")]
    TooManyMatchers {
        name: String,
        count: usize,
        limit: usize,
    },

    #[error("batch size must be at least one character")]
    ZeroBatch,

    #[error("invalid token series table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Misuse of a [`MarkdownMachine`](crate::MarkdownMachine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The machine was called again from inside one of its own reporting
    /// callbacks.
    #[error("markdown machine re-entered from a reporting callback")]
    Reentrant,
}
