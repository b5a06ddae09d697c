//! CLI command implementations.
//!
//! Handlers share one shape: check required flags, resolve the connection
//! settings, confirm destructive actions, connect, run the remote calls under
//! one deadline, close the client, then report. Nothing touches the network
//! before the flag and configuration checks pass.

pub mod index;
pub mod node;
pub mod query;
pub mod role;
pub mod user;

use std::sync::Arc;

use asvec_client::{AdminClient, Connector, Credentials};
use tokio_util::sync::CancellationToken;

use crate::bootstrap;
use crate::config::{self, ClientConfig, Env};
use crate::error::{CliError, Result};
use crate::flags::ClientArgs;
use crate::prompt::{self, Input};
use crate::view::View;
use crate::watch::Watch;

/// Everything a command needs from the process it runs in.
pub struct Session<'a> {
    pub view: View,
    pub input: Input,
    pub env: Env,
    pub connector: &'a dyn Connector,
    /// Cancels watch loops.
    pub shutdown: CancellationToken,
    /// The full invocation, echoed by watch mode.
    pub argv: Vec<String>,
    /// Whether watch mode installs signal handlers.
    pub signals: bool,
}

impl Session<'_> {
    pub fn resolve(&self, args: &ClientArgs) -> Result<ClientConfig> {
        config::resolve(args, &self.env)
    }

    /// Asks `question` unless `yes` was given.
    pub fn confirm(&mut self, yes: bool, question: &str) -> Result<bool> {
        if yes {
            return Ok(true);
        }
        prompt::confirm(&mut self.view, &mut self.input, question)
    }

    /// Connects, prompting for the password when only a user is known.
    pub async fn connect(&mut self, config: &ClientConfig) -> Result<Arc<dyn AdminClient>> {
        let credentials = match &config.credentials {
            None => None,
            Some(pending) => {
                let password = match &pending.password {
                    Some(password) => password.clone(),
                    None => prompt::password(&mut self.view, &mut self.input, "Enter Password: ")?,
                };
                Some(Credentials {
                    username: pending.username.clone(),
                    password,
                })
            }
        };
        bootstrap::connect(config, credentials, self.connector).await
    }

    pub fn watch(&self) -> Watch {
        Watch {
            argv: self.argv.clone(),
            shutdown: self.shutdown.clone(),
            signals: self.signals,
        }
    }
}

/// Fails with every flag whose presence is false, sorted by name.
pub fn require(flags: &[(&str, bool)]) -> Result<()> {
    let mut missing: Vec<String> = flags
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| (*name).to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(CliError::MissingFlags(missing))
}
