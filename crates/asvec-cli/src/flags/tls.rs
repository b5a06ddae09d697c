//! TLS flags.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use asvec_client::TlsVersion;
use clap::Args;

use super::{FlagError, FlagValue, parse};

/// Enabled TLS protocol range.
///
/// Parsed from Apache `SSLProtocol` syntax: space-separated tokens, each
/// optionally prefixed with `+` (enable) or `-` (disable). `all` stands for
/// every supported version. Only `TLSv1.2` and `TLSv1.3` are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsProtocols {
    pub min: TlsVersion,
    pub max: TlsVersion,
}

impl Default for TlsProtocols {
    fn default() -> Self {
        Self {
            min: TlsVersion::Tls12,
            max: TlsVersion::Tls13,
        }
    }
}

impl FlagValue for TlsProtocols {
    const KIND: &'static str = "\"[[+][-]all] [[+][-]TLSv1.2] [[+][-]TLSv1.3]\"";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        let mut enabled = BTreeSet::new();
        for token in text.split_whitespace() {
            let (remove, name) = match token.as_bytes().first() {
                Some(b'+') => (false, &token[1..]),
                Some(b'-') => (true, &token[1..]),
                _ => (false, token),
            };
            let versions: &[TlsVersion] = match name {
                "all" => &[TlsVersion::Tls12, TlsVersion::Tls13],
                "TLSv1.2" => &[TlsVersion::Tls12],
                "TLSv1.3" => &[TlsVersion::Tls13],
                "SSLv2" | "SSLv3" | "TLSv1" | "TLSv1.1" => {
                    return Err(FlagError::invalid(
                        "tls protocols",
                        text,
                        format!("{name} is not supported"),
                    ));
                }
                _ => {
                    return Err(FlagError::invalid(
                        "tls protocols",
                        text,
                        format!("unknown protocol {name:?}"),
                    ));
                }
            };
            for version in versions {
                if remove {
                    enabled.remove(version);
                } else {
                    enabled.insert(*version);
                }
            }
        }

        match (enabled.first(), enabled.last()) {
            (Some(min), Some(max)) => Ok(Self {
                min: *min,
                max: *max,
            }),
            _ => Err(FlagError::invalid(
                "tls protocols",
                text,
                "no protocols selected",
            )),
        }
    }

    fn format_flag(&self) -> String {
        if self.min == self.max {
            self.min.to_string()
        } else {
            format!("{} {}", self.min, self.max)
        }
    }
}

/// TLS connection flags.
#[derive(Args, Clone, Default)]
pub struct TlsArgs {
    /// The CA used when connecting to the service. [env: ASVEC_TLS_CAFILE]
    #[arg(long = "tls-cafile", value_name = "path", global = true)]
    pub cafile: Option<PathBuf>,

    /// A directory containing CAs for connecting to the service. [env: ASVEC_TLS_CAPATH]
    #[arg(long = "tls-capath", value_name = "path", global = true)]
    pub capath: Option<PathBuf>,

    /// The certificate file for mutual TLS authentication. [env: ASVEC_TLS_CERTFILE]
    #[arg(long = "tls-certfile", value_name = "path", global = true)]
    pub certfile: Option<PathBuf>,

    /// The key file used for mutual TLS authentication. [env: ASVEC_TLS_KEYFILE]
    #[arg(long = "tls-keyfile", value_name = "path", global = true)]
    pub keyfile: Option<PathBuf>,

    /// The password used to decrypt the key file. [env: ASVEC_TLS_KEYFILE_PASSWORD]
    #[arg(long = "tls-keyfile-password", value_name = "password", global = true)]
    pub keyfile_password: Option<String>,

    /// TLS protocol selection, in Apache SSLProtocol syntax.
    #[arg(
        long = "tls-protocols",
        value_name = "protocols",
        global = true,
        allow_hyphen_values = true,
        value_parser = parse::<TlsProtocols>
    )]
    pub protocols: Option<TlsProtocols>,

    /// The hostname to use when validating the server certificate.
    #[arg(long = "tls-hostname-override", value_name = "hostname", global = true)]
    pub hostname_override: Option<String>,
}

impl fmt::Debug for TlsArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsArgs")
            .field("cafile", &self.cafile)
            .field("capath", &self.capath)
            .field("certfile", &self.certfile)
            .field("keyfile", &self.keyfile)
            .field(
                "keyfile_password",
                &self.keyfile_password.as_ref().map(|_| "*"),
            )
            .field("protocols", &self.protocols)
            .field("hostname_override", &self.hostname_override)
            .finish()
    }
}
