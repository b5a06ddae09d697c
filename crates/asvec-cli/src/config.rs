//! Connection settings resolved from flags, the environment and defaults.
//!
//! Precedence is flag, then `ASVEC_*` environment variable, then default.
//! Resolution happens before any network activity, so every problem found
//! here (both `--host` and `--seeds`, unreadable TLS files, malformed
//! credentials) aborts the command without a remote call.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use asvec_client::{Endpoint, HostPort, TlsMaterial};

use crate::error::{CliError, Result};
use crate::flags::{
    ClientArgs, CredentialsArgs, DEFAULT_HOST, DEFAULT_PORT, FlagValue, Seeds, TlsArgs,
    UserPassword, parse_host_port,
};

/// Prefix of every environment variable the tool reads.
pub const ENV_PREFIX: &str = "ASVEC_";

/// Timeout used when `--timeout` is not given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A snapshot of the `ASVEC_*` environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars()
                .filter(|(name, _)| name.starts_with(ENV_PREFIX))
                .collect(),
        }
    }

    /// Builds an environment from full variable names and values.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Looks up `ASVEC_<name>`. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(&format!("{ENV_PREFIX}{name}"))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn parsed<T: FlagValue>(&self, name: &str) -> Result<Option<T>> {
        self.get(name)
            .map(|text| {
                T::parse_flag(text).map_err(|e| {
                    CliError::Arg(format!("failed to parse {ENV_PREFIX}{name}: {e}"))
                })
            })
            .transpose()
    }
}

/// A user whose password may still have to be prompted for.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingCredentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for PendingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "*"))
            .finish()
    }
}

/// Fully resolved connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    pub listener_name: Option<String>,
    pub credentials: Option<PendingCredentials>,
    pub tls: Option<TlsMaterial>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// True when the tool talks to a single address with discovery disabled.
    pub fn is_load_balancer(&self) -> bool {
        self.endpoint.is_load_balancer()
    }
}

/// Resolves connection settings.
pub fn resolve(args: &ClientArgs, env: &Env) -> Result<ClientConfig> {
    let host = match &args.host {
        Some(host) => Some(host.clone()),
        None => env
            .get("HOST")
            .map(|text| {
                parse_host_port(text).map_err(|e| {
                    CliError::Arg(format!("failed to parse {ENV_PREFIX}HOST: {e}"))
                })
            })
            .transpose()?,
    };
    let seeds = match &args.seeds {
        Some(seeds) => Some(seeds.clone()),
        None => env.parsed::<Seeds>("SEEDS")?,
    };

    let endpoint = match (host, seeds) {
        (Some(_), Some(_)) => return Err(CliError::HostAndSeeds),
        (Some(host), None) => Endpoint::LoadBalancer(host),
        (None, Some(Seeds(seeds))) => Endpoint::Seeds(seeds),
        (None, None) => Endpoint::LoadBalancer(HostPort::new(DEFAULT_HOST, DEFAULT_PORT)),
    };

    let config = ClientConfig {
        endpoint,
        listener_name: args.listener_name.clone(),
        credentials: resolve_credentials(&args.credentials, env)?,
        tls: load_tls(&args.tls, env)?,
        timeout: args.timeout.map_or(DEFAULT_TIMEOUT, |t| t.0),
    };
    tracing::debug!(?config, "resolved client configuration");
    Ok(config)
}

fn resolve_credentials(
    args: &CredentialsArgs,
    env: &Env,
) -> Result<Option<PendingCredentials>> {
    let env_pair = env.parsed::<UserPassword>("CREDENTIALS")?;

    let user = args
        .user
        .clone()
        .or_else(|| args.credentials.as_ref().map(|c| c.user.clone()))
        .or_else(|| env.get("USER").map(String::from))
        .or_else(|| env_pair.as_ref().map(|c| c.user.clone()));
    let password = args
        .password
        .clone()
        .or_else(|| args.credentials.as_ref().and_then(|c| c.password.clone()))
        .or_else(|| env.get("PASSWORD").map(String::from))
        .or_else(|| env_pair.as_ref().and_then(|c| c.password.clone()));

    match (user, password) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(CliError::Config(
            "a password was provided without a user".to_string(),
        )),
        (Some(user), _) if user.is_empty() => {
            Err(CliError::Config("the user must not be empty".to_string()))
        }
        (Some(username), password) => Ok(Some(PendingCredentials { username, password })),
    }
}

fn load_tls(args: &TlsArgs, env: &Env) -> Result<Option<TlsMaterial>> {
    let from_env = |name: &str| env.get(name).map(PathBuf::from);
    let cafile = args.cafile.clone().or_else(|| from_env("TLS_CAFILE"));
    let capath = args.capath.clone().or_else(|| from_env("TLS_CAPATH"));
    let certfile = args.certfile.clone().or_else(|| from_env("TLS_CERTFILE"));
    let keyfile = args.keyfile.clone().or_else(|| from_env("TLS_KEYFILE"));
    let key_password = args
        .keyfile_password
        .clone()
        .or_else(|| env.get("TLS_KEYFILE_PASSWORD").map(String::from));

    if cafile.is_none() && capath.is_none() && certfile.is_none() && keyfile.is_none() {
        if args.protocols.is_some() || args.hostname_override.is_some() {
            tracing::warn!("TLS options given without any TLS certificate; connecting without TLS");
        }
        return Ok(None);
    }
    if certfile.is_some() != keyfile.is_some() {
        return Err(CliError::Config(
            "--tls-certfile and --tls-keyfile must be provided together".to_string(),
        ));
    }

    let mut root_certificates = Vec::new();
    if let Some(path) = &cafile {
        root_certificates.push(read_file("tls-cafile", path)?);
    }
    if let Some(dir) = &capath {
        root_certificates.extend(read_dir("tls-capath", dir)?);
    }
    let client_certificate = certfile
        .as_deref()
        .map(|path| read_file("tls-certfile", path))
        .transpose()?;
    let client_key = keyfile
        .as_deref()
        .map(|path| read_file("tls-keyfile", path))
        .transpose()?;

    let protocols = args.protocols.unwrap_or_default();
    Ok(Some(TlsMaterial {
        root_certificates,
        client_certificate,
        client_key,
        key_password,
        min_version: protocols.min,
        max_version: protocols.max,
        hostname_override: args.hostname_override.clone(),
    }))
}

fn read_file(flag: &str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CliError::Config(format!("failed to read --{flag} {}: {e}", path.display())))
}

fn read_dir(flag: &str, dir: &Path) -> Result<Vec<Vec<u8>>> {
    let unreadable =
        |e: std::io::Error| CliError::Config(format!("failed to read --{flag} {}: {e}", dir.display()));
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|path| read_file(flag, path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{FlagDuration, TlsProtocols};
    use asvec_client::TlsVersion;
    use std::io::Write;

    fn host(text: &str) -> HostPort {
        parse_host_port(text).unwrap()
    }

    #[test]
    fn test_defaults_to_local_load_balancer() {
        let config = resolve(&ClientArgs::default(), &Env::default()).unwrap();
        assert_eq!(
            config.endpoint,
            Endpoint::LoadBalancer(HostPort::new("127.0.0.1", 5000))
        );
        assert!(config.is_load_balancer());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.credentials.is_none());
        assert!(config.tls.is_none());
    }

    #[test]
    fn test_host_and_seeds_conflict() {
        let args = ClientArgs {
            host: Some(host("1.1.1.1:3001")),
            seeds: Some(Seeds(vec![host("2.2.2.2:3000")])),
            ..ClientArgs::default()
        };
        let err = resolve(&args, &Env::default()).unwrap_err();
        assert!(err.to_string().contains("only --seeds or --host allowed"));
    }

    #[test]
    fn test_conflict_across_flag_and_env() {
        let args = ClientArgs {
            host: Some(host("1.1.1.1")),
            ..ClientArgs::default()
        };
        let env = Env::from_pairs([("ASVEC_SEEDS", "2.2.2.2:3000")]);
        assert!(matches!(resolve(&args, &env), Err(CliError::HostAndSeeds)));
    }

    #[test]
    fn test_flag_beats_env() {
        let args = ClientArgs {
            seeds: Some(Seeds(vec![host("10.0.0.1:3000")])),
            timeout: Some(FlagDuration(Duration::from_millis(250))),
            ..ClientArgs::default()
        };
        let env = Env::from_pairs([("ASVEC_USER", "env-user"), ("ASVEC_PASSWORD", "pw")]);
        let config = resolve(&args, &env).unwrap();
        assert_eq!(config.endpoint, Endpoint::Seeds(vec![host("10.0.0.1:3000")]));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(
            config.credentials,
            Some(PendingCredentials {
                username: "env-user".to_string(),
                password: Some("pw".to_string()),
            })
        );
    }

    #[test]
    fn test_env_seeds() {
        let env = Env::from_pairs([("ASVEC_SEEDS", "1.1.1.1:3000,2.2.2.2")]);
        let config = resolve(&ClientArgs::default(), &env).unwrap();
        assert_eq!(
            config.endpoint,
            Endpoint::Seeds(vec![host("1.1.1.1:3000"), host("2.2.2.2:5000")])
        );
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let env = Env::from_pairs([("ASVEC_HOST", "1.1.1.1:3000:")]);
        let err = resolve(&ClientArgs::default(), &env).unwrap_err();
        assert!(err.to_string().contains("ASVEC_HOST"));
    }

    #[test]
    fn test_credentials_precedence() {
        let args = ClientArgs {
            credentials: CredentialsArgs {
                user: Some("flag-user".to_string()),
                password: None,
                credentials: Some(UserPassword::parse_flag("pair-user:pair-pw").unwrap()),
            },
            ..ClientArgs::default()
        };
        let config = resolve(&args, &Env::default()).unwrap();
        let creds = config.credentials.unwrap();
        assert_eq!(creds.username, "flag-user");
        assert_eq!(creds.password.as_deref(), Some("pair-pw"));
    }

    #[test]
    fn test_user_without_password_is_pending() {
        let env = Env::from_pairs([("ASVEC_CREDENTIALS", "admin")]);
        let creds = resolve(&ClientArgs::default(), &env)
            .unwrap()
            .credentials
            .unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, None);
    }

    #[test]
    fn test_password_without_user_rejected() {
        let env = Env::from_pairs([("ASVEC_PASSWORD", "pw")]);
        assert!(matches!(
            resolve(&ClientArgs::default(), &env),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_tls_material_read_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let ca_path = dir.path().join("ca.pem");
        std::fs::File::create(&ca_path)
            .unwrap()
            .write_all(b"-----BEGIN CERTIFICATE-----")
            .unwrap();
        let args = ClientArgs {
            tls: TlsArgs {
                cafile: Some(ca_path),
                protocols: Some(TlsProtocols::parse_flag("TLSv1.3").unwrap()),
                ..TlsArgs::default()
            },
            ..ClientArgs::default()
        };

        let tls = resolve(&args, &Env::default()).unwrap().tls.unwrap();

        assert_eq!(tls.root_certificates, vec![b"-----BEGIN CERTIFICATE-----".to_vec()]);
        assert_eq!(tls.min_version, TlsVersion::Tls13);
    }

    #[test]
    fn test_tls_capath_reads_every_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pem"), "a").unwrap();
        std::fs::write(dir.path().join("b.pem"), "b").unwrap();
        let env = Env::from_pairs([("ASVEC_TLS_CAPATH", dir.path().to_string_lossy().to_string())]);

        let tls = resolve(&ClientArgs::default(), &env).unwrap().tls.unwrap();

        assert_eq!(tls.root_certificates, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_missing_tls_file_is_config_error() {
        let args = ClientArgs {
            tls: TlsArgs {
                cafile: Some(PathBuf::from("/definitely/not/here.pem")),
                ..TlsArgs::default()
            },
            ..ClientArgs::default()
        };
        let err = resolve(&args, &Env::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("tls-cafile"));
    }

    #[test]
    fn test_cert_without_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "cert").unwrap();
        let args = ClientArgs {
            tls: TlsArgs {
                certfile: Some(cert),
                ..TlsArgs::default()
            },
            ..ClientArgs::default()
        };
        assert!(matches!(
            resolve(&args, &Env::default()),
            Err(CliError::Config(_))
        ));
    }
}
