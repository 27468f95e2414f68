//! Error types for docbase operations.
//!
//! This module provides the `Error` type and `Result<T>` alias used by the
//! client crates. Local validation failures (absent references, malformed
//! paths, unencodable data) are detected before any remote call; transport
//! failures arrive as a [`Status`] from the invocation layer.

use docbase_gax::{Code, Status};
use thiserror::Error;

/// Errors that can occur in docbase operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An operation was invoked on an absent reference.
    #[error("docbase: nil document or collection reference")]
    NilReference,

    /// A path could not be resolved.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Data could not be converted to or from document fields.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client has been closed.
    #[error("docbase: client is closed")]
    Closed,

    /// The remote call failed.
    #[error(transparent)]
    Status(#[from] Status),
}

impl Error {
    /// Create an invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The status code of a remote failure, if this is one.
    pub fn code(&self) -> Option<Code> {
        match self {
            Error::Status(status) => Some(status.code()),
            _ => None,
        }
    }

    /// True if the remote call failed because the document already exists.
    pub fn is_already_exists(&self) -> bool {
        self.code() == Some(Code::AlreadyExists)
    }

    /// True if the remote call failed because the resource was not found.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(Code::NotFound)
    }
}

impl From<docbase_gax::Error> for Error {
    fn from(e: docbase_gax::Error) -> Self {
        match e {
            docbase_gax::Error::Status(status) => Error::Status(status),
            docbase_gax::Error::Closed => Error::Closed,
            docbase_gax::Error::Config(msg) => Error::Config(msg),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using docbase's Error type.
pub type Result<T> = std::result::Result<T, Error>;
