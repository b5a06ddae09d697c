//! Connection targets, credentials and TLS material.

use std::fmt;
use std::time::Duration;

/// A host and port pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How the client reaches the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A single address in front of the cluster. Node discovery is disabled.
    LoadBalancer(HostPort),
    /// One or more cluster nodes, used to discover the rest.
    Seeds(Vec<HostPort>),
}

impl Endpoint {
    /// True for [`Endpoint::LoadBalancer`].
    pub fn is_load_balancer(&self) -> bool {
        matches!(self, Self::LoadBalancer(_))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadBalancer(host) => write!(f, "{host}"),
            Self::Seeds(seeds) => {
                for (i, seed) in seeds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{seed}")?;
                }
                Ok(())
            }
        }
    }
}

/// A username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// A TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tls12 => "TLSv1.2",
            Self::Tls13 => "TLSv1.3",
        })
    }
}

/// TLS settings, with every file already read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    /// PEM-encoded root certificates.
    pub root_certificates: Vec<Vec<u8>>,
    /// PEM-encoded client certificate for mutual TLS.
    pub client_certificate: Option<Vec<u8>>,
    /// PEM-encoded client key for mutual TLS.
    pub client_key: Option<Vec<u8>>,
    pub key_password: Option<String>,
    pub min_version: TlsVersion,
    pub max_version: TlsVersion,
    /// Name to verify instead of the dialed host.
    pub hostname_override: Option<String>,
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("root_certificates", &self.root_certificates.len())
            .field("client_certificate", &self.client_certificate.is_some())
            .field("client_key", &self.client_key.is_some())
            .field("min_version", &self.min_version)
            .field("max_version", &self.max_version)
            .field("hostname_override", &self.hostname_override)
            .finish()
    }
}

/// Everything a [`Connector`](crate::Connector) needs to open a client.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub endpoint: Endpoint,
    /// Advertised listener to ask nodes for during discovery.
    pub listener_name: Option<String>,
    pub credentials: Option<Credentials>,
    pub tls: Option<TlsMaterial>,
    /// Upper bound on connection setup.
    pub timeout: Duration,
}

impl ConnectOptions {
    /// Plain-text, unauthenticated options for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            listener_name: None,
            credentials: None,
            tls: None,
            timeout: Duration::from_secs(5),
        }
    }
}
