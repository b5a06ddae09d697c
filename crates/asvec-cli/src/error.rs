//! Error types for the command-line tool.
//!
//! Every variant maps to exit code 1. The variants follow the user-visible
//! error kinds: argument problems are caught before any network call,
//! configuration problems before connecting, and remote failures keep the
//! service message intact.

use std::time::Duration;

use asvec_client::ClientError;
use thiserror::Error;

use crate::flags::FlagError;

/// Result type alias for command handlers.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by `asvec`.
#[derive(Error, Debug)]
pub enum CliError {
    /// A flag value or flag combination was rejected.
    #[error("{0}")]
    Arg(String),

    /// Required flags were not supplied. Names are sorted.
    #[error("required flag(s) {} not set", quote_all(.0))]
    MissingFlags(Vec<String>),

    /// Both `--host` and `--seeds` were given.
    #[error("only --seeds or --host allowed")]
    HostAndSeeds,

    /// TLS material or credentials could not be loaded.
    #[error("{0}")]
    Config(String),

    /// The client could not be created.
    #[error("unable to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ClientError,
    },

    /// A remote call failed. The service message is kept verbatim.
    #[error("{action}: {source}")]
    Remote {
        action: String,
        #[source]
        source: ClientError,
    },

    /// Some entries of a batch failed.
    #[error("failed to create {failed} of {total} indexes")]
    PartialFailure { failed: usize, total: usize },

    /// A remote call did not finish before the deadline.
    #[error("{operation}: deadline of {timeout:?} exceeded")]
    Timeout { operation: String, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The interactive terminal could not be driven.
    #[error("terminal error: {0}")]
    Terminal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Wraps a remote failure with the action that was attempted.
    pub fn remote(action: impl Into<String>, source: ClientError) -> Self {
        Self::Remote {
            action: action.into(),
            source,
        }
    }

    /// The underlying remote error, if any.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Remote { source, .. } | Self::Connect { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FlagError> for CliError {
    fn from(err: FlagError) -> Self {
        Self::Arg(err.to_string())
    }
}

fn quote_all(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
