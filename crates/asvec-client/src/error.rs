//! Error types for remote calls.

use std::fmt;

use thiserror::Error;

/// Result type alias for remote calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Status code carried by a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// The named resource does not exist.
    NotFound,
    /// The resource being created already exists.
    AlreadyExists,
    /// The caller lacks a required role.
    PermissionDenied,
    /// The request was malformed or violated a server rule.
    InvalidArgument,
    /// Credentials were missing or rejected.
    Unauthenticated,
    /// The target node could not be reached.
    Unavailable,
    /// Anything else.
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::PermissionDenied => "PermissionDenied",
            Self::InvalidArgument => "InvalidArgument",
            Self::Unauthenticated => "Unauthenticated",
            Self::Unavailable => "Unavailable",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Errors returned by an [`AdminClient`](crate::AdminClient) or
/// [`Connector`](crate::Connector).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The service answered with a failure status.
    #[error("{code}: {message}")]
    Status {
        /// Status code.
        code: Code,
        /// Server-provided message, surfaced verbatim.
        message: String,
    },

    /// No connection could be established.
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// The endpoint that was tried.
        endpoint: String,
        /// Why it failed.
        reason: String,
    },

    /// The client was used after `close`.
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// Builds a status error.
    pub fn status(code: Code, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Code::NotFound`] status.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(Code::NotFound, message)
    }

    /// Shorthand for a [`Code::InvalidArgument`] status.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::status(Code::InvalidArgument, message)
    }

    /// Returns the status code, if this is a status error.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for a [`Code::NotFound`] status.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(Code::NotFound)
    }
}
