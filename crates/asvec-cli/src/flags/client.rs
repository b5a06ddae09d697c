//! Connection flags shared by every command.

use std::fmt;

use asvec_client::HostPort;
use clap::Args;

use super::host::{parse_host_port, parse_seeds};
use super::tls::TlsArgs;
use super::{FlagDuration, FlagError, FlagValue, parse};

/// A comma-separated seed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seeds(pub Vec<HostPort>);

impl FlagValue for Seeds {
    const KIND: &'static str = "host[:port][,host[:port]]";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        parse_seeds(text).map(Self)
    }

    fn format_flag(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// `user[:password]`, split at the first colon.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword {
    pub user: String,
    pub password: Option<String>,
}

impl FlagValue for UserPassword {
    const KIND: &'static str = "<user>[:<pass>]";

    fn parse_flag(text: &str) -> Result<Self, FlagError> {
        Ok(match text.split_once(':') {
            Some((user, password)) => Self {
                user: user.to_string(),
                password: Some(password.to_string()),
            },
            None => Self {
                user: text.to_string(),
                password: None,
            },
        })
    }

    fn format_flag(&self) -> String {
        match self.password {
            Some(_) => format!("{}:*", self.user),
            None => self.user.clone(),
        }
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_flag())
    }
}

/// Authentication flags.
#[derive(Args, Clone, Default)]
pub struct CredentialsArgs {
    /// The user to authenticate as. [env: ASVEC_USER]
    #[arg(short = 'U', long, value_name = "user", global = true)]
    pub user: Option<String>,

    /// The password for the user. [env: ASVEC_PASSWORD]
    #[arg(short = 'P', long, value_name = "password", global = true)]
    pub password: Option<String>,

    /// The user and password in one value. [env: ASVEC_CREDENTIALS]
    #[arg(short = 'C', long, value_name = "<user>[:<pass>]", global = true, value_parser = parse::<UserPassword>)]
    pub credentials: Option<UserPassword>,
}

impl fmt::Debug for CredentialsArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsArgs")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "*"))
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Flags that describe how to reach the cluster.
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// The service host to connect to, usually a load balancer. Mutually
    /// exclusive with --seeds. Defaults to 127.0.0.1:5000. [env: ASVEC_HOST]
    #[arg(long, value_name = "host[:port]", global = true, value_parser = parse_host_port)]
    pub host: Option<HostPort>,

    /// Seed nodes used to discover the cluster. Mutually exclusive with
    /// --host. [env: ASVEC_SEEDS]
    #[arg(long, value_name = "host[:port][,...]", global = true, value_parser = parse::<Seeds>)]
    pub seeds: Option<Seeds>,

    /// The listener to ask the server for when discovering the cluster.
    #[arg(short = 'l', long = "listener-name", value_name = "name", global = true)]
    pub listener_name: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialsArgs,

    #[command(flatten)]
    pub tls: TlsArgs,

    /// The deadline for connecting and for each command's remote calls.
    #[arg(long, value_name = "duration", global = true, value_parser = parse::<FlagDuration>)]
    pub timeout: Option<FlagDuration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_password_split() {
        let both = UserPassword::parse_flag("admin:pa:ss").unwrap();
        assert_eq!(both.user, "admin");
        assert_eq!(both.password.as_deref(), Some("pa:ss"));

        let user_only = UserPassword::parse_flag("admin").unwrap();
        assert_eq!(user_only.password, None);

        let empty_password = UserPassword::parse_flag("admin:").unwrap();
        assert_eq!(empty_password.password.as_deref(), Some(""));
    }

    #[test]
    fn test_credentials_debug_masks_passwords() {
        let args = CredentialsArgs {
            user: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
            credentials: Some(UserPassword::parse_flag("root:toor").unwrap()),
        };
        let debug = format!("{args:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("toor"));
    }

    #[test]
    fn test_seeds_format() {
        let seeds = Seeds::parse_flag("1.1.1.1:3000,[::1]").unwrap();
        assert_eq!(seeds.format_flag(), "1.1.1.1:3000,[::1]:5000");
    }
}
