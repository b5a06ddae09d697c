//! Typed flag values and flag groups.
//!
//! Every tunable flag is declared as `Option<T>` where `T: FlagValue`. `None`
//! is "never supplied" and stays distinct from any value, including zero, so
//! handlers can leave unnamed fields out of remote requests entirely.
//!
//! Scalars accept the usual shell spellings: integers in any base prefix
//! (`0x`, `0o`, `0b`, leading `0`), booleans as `1/0/t/f/true/false` in the
//! usual casings, and durations as composite strings like `10ms` or `2h30m`.

mod client;
mod duration;
mod enums;
mod hnsw;
mod host;
mod output;
mod scalar;
mod timestamp;
mod tls;
mod vector;

pub use client::{ClientArgs, CredentialsArgs, Seeds, UserPassword};
pub use duration::{FlagDuration, InfDuration, format_duration};
pub use enums::{LogLevel, metric_names};
pub use hnsw::{
    BatchingArgs, HealerArgs, HnswGraphArgs, HnswTuningArgs, IndexCachingArgs, MergeArgs,
    RecordCachingArgs,
};
pub use host::{DEFAULT_HOST, DEFAULT_PORT, parse_host_port, parse_seeds};
pub use output::{FormatArgs, WatchArgs};
pub use timestamp::UnixTimestamp;
pub use tls::{TlsArgs, TlsProtocols};
pub use vector::{format_float, format_vector};

use thiserror::Error;

/// Rendered in place of a flag that was never supplied.
pub const NOT_SET: &str = "<nil>";

/// A flag value failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("invalid {kind} {text:?}: {reason}")]
    Invalid {
        kind: &'static str,
        text: String,
        reason: String,
    },

    #[error("empty vector not allowed")]
    EmptyVector,
}

impl FlagError {
    pub(crate) fn invalid(kind: &'static str, text: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            kind,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A value that can be supplied as a flag.
pub trait FlagValue: Sized {
    /// Kind name, shown as the value placeholder in usage strings.
    const KIND: &'static str;

    fn parse_flag(text: &str) -> Result<Self, FlagError>;

    fn format_flag(&self) -> String;
}

/// clap value parser for any [`FlagValue`].
pub fn parse<T: FlagValue>(text: &str) -> Result<T, FlagError> {
    T::parse_flag(text)
}

/// Formats an optional flag, using [`NOT_SET`] when it was never supplied.
pub fn format_optional<T: FlagValue>(value: Option<&T>) -> String {
    value.map_or_else(|| NOT_SET.to_string(), FlagValue::format_flag)
}

/// Parses a `key=value` label pair.
pub fn parse_label(text: &str) -> Result<(String, String), FlagError> {
    text.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| FlagError::invalid("label", text, "expected key=value"))
}
