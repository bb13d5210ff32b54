// src/error.rs

//! Unified error handling for the feed pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Unified error type for everything that can go wrong while talking to the
/// upstream site.
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP transport failure: connection error, timeout, or non-success
    /// status. Never retried internally.
    #[error("transport failure during {stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The fetched document could not be parsed at all.
    #[error("parse failure during {stage}: {message}")]
    Parse {
        stage: &'static str,
        message: String,
    },

    /// A required structural anchor is missing from the document. The
    /// upstream layout has changed in a breaking way.
    #[error("structure drift during {stage}: {message}")]
    Drift {
        stage: &'static str,
        message: String,
    },

    /// One or more optional sub-operations failed without aborting the
    /// overall operation.
    #[error("{0}")]
    Partial(PartialFailure),

    /// The caller violated an API precondition.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// The upstream site rejected a vote request.
    #[error("vote rejected: {0}")]
    Vote(String),

    /// CSS selector parsing failed.
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// URL parsing failed.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Create a transport error with stage context.
    pub fn transport(stage: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { stage, source }
    }

    /// Create a parse error with stage context.
    pub fn parse(stage: &'static str, message: impl fmt::Display) -> Self {
        Self::Parse {
            stage,
            message: message.to_string(),
        }
    }

    /// Create a structure-drift error with stage context.
    pub fn drift(stage: &'static str, message: impl fmt::Display) -> Self {
        Self::Drift {
            stage,
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Failures collected from a batch of optional sub-operations. The
/// successful part of the batch is always returned alongside.
#[derive(Debug)]
pub struct PartialFailure {
    /// Number of sub-operations attempted.
    pub attempted: usize,

    /// The sub-operations that failed.
    pub failures: Vec<DetailFailure>,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} detail operations failed",
            self.failures.len(),
            self.attempted
        )
    }
}

/// A single post whose detail operation failed.
#[derive(Debug)]
pub struct DetailFailure {
    /// Upstream ID of the affected post, when it had one.
    pub post_id: Option<String>,

    /// What went wrong for this post.
    pub error: FeedError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_display_carries_stage() {
        let error = FeedError::drift("sections", "missing anchor");
        assert_eq!(
            error.to_string(),
            "structure drift during sections: missing anchor"
        );
    }

    #[test]
    fn test_partial_failure_display() {
        let partial = PartialFailure {
            attempted: 3,
            failures: vec![DetailFailure {
                post_id: Some("a1".into()),
                error: FeedError::precondition("nope"),
            }],
        };
        assert_eq!(partial.to_string(), "1 of 3 detail operations failed");
    }
}
