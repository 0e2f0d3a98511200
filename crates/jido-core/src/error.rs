//! Error taxonomy for the Jido agent runtime (spec §7).

use thiserror::Error;

/// The runtime's error taxonomy. Caller-facing variants (`Validation`,
/// `NotFound`, `AlreadyStarted`, `Timeout`) are returned directly from the
/// lifecycle API. Internal variants (`Strategy`, `Directive`) are captured
/// at the point of failure, wrapped in an `Error` directive, and handed to
/// the configured error policy rather than propagated as a panic.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already started: {0}")]
    AlreadyStarted(String),

    #[error("overloaded: {0}")]
    Overloaded(String),

    #[error("strategy error: {kind} - {reason}")]
    Strategy { kind: String, reason: String },

    #[error("directive error: {kind} - {reason}")]
    Directive { kind: String, reason: String },

    #[error("timeout")]
    Timeout,

    #[error("parent died")]
    ParentDied,

    #[error("max errors exceeded: {count}")]
    MaxErrorsExceeded { count: u64 },

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_started(id: impl Into<String>) -> Self {
        Self::AlreadyStarted(id.into())
    }

    pub fn strategy(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Strategy {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn directive(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Directive {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error kind is caller-facing per spec §7's propagation
    /// policy, as opposed to one routed through the error policy.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound(_)
                | Error::AlreadyStarted(_)
                | Error::Timeout
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(e.to_string())
    }
}
