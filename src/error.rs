//! Error types
//!
//! A single tagged error for every probe operation, so step code can branch
//! on *why* something failed instead of inspecting message strings.

use std::time::Duration;

/// Result type for probe operations
pub type Result<T = ()> = std::result::Result<T, Error>;

/// Errors surfaced to the calling step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid filter, timeout or settings. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote service was unreachable or rejected the call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No matching update arrived before the deadline.
    #[error("No matching update within {elapsed:?} (cursor: {cursor:?})")]
    Timeout {
        elapsed: Duration,
        cursor: Option<i64>,
    },

    /// A step read fixture state that an earlier step never populated.
    #[error("Fixture state '{0}' was read before it was set")]
    UnsetState(&'static str),

    /// The remote API refused the request. Displays the server text verbatim.
    #[error("{message}")]
    InvalidRequest { code: u16, message: String },

    /// A step's expectation did not hold.
    #[error("Assertion failed: {0}")]
    Assertion(String),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Short tag used in reports and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Transport(_) => "transport",
            Error::Timeout { .. } => "timeout",
            Error::UnsetState(_) => "unset_state",
            Error::InvalidRequest { .. } => "invalid_request",
            Error::Assertion(_) => "assertion",
        }
    }
}

/// Fail the current step with [`Error::Assertion`] unless `cond` holds.
pub fn ensure(cond: bool, what: impl Into<String>) -> Result {
    if cond {
        Ok(())
    } else {
        Err(Error::Assertion(what.into()))
    }
}

/// Fail the current step unless `left == right`.
pub fn ensure_eq<T>(left: T, right: T, what: &str) -> Result
where
    T: PartialEq + std::fmt::Debug,
{
    if left == right {
        Ok(())
    } else {
        Err(Error::Assertion(format!(
            "{}: expected {:?}, got {:?}",
            what, left, right
        )))
    }
}
