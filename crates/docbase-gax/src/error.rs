//! Error type for the invocation layer.

use thiserror::Error;

use crate::status::{Code, Status};

/// Errors produced while invoking a remote call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The remote call (or its deadline/cancellation scope) failed.
    #[error(transparent)]
    Status(#[from] Status),

    /// The connection pool has been closed.
    #[error("connection pool is closed")]
    Closed,

    /// Invalid invocation-layer configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The status code, if this error came from a remote call.
    pub fn code(&self) -> Option<Code> {
        match self {
            Error::Status(status) => Some(status.code()),
            _ => None,
        }
    }
}

/// Result type alias using the invocation layer's Error type.
pub type Result<T> = std::result::Result<T, Error>;
