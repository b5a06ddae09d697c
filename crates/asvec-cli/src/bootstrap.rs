//! Client construction and per-command deadlines.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use asvec_client::{AdminClient, ClientError, ConnectOptions, Connector, Credentials};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::{CliError, Result};

/// The instant by which every remote call of one command must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

/// A remote call that did not succeed.
#[derive(Error, Debug)]
pub enum Failure {
    #[error(transparent)]
    Remote(ClientError),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Failure {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_not_found())
    }
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one remote call, keeping the failure for the caller to judge.
    pub async fn call<T, F>(&self, call: F) -> std::result::Result<T, Failure>
    where
        F: Future<Output = asvec_client::Result<T>>,
    {
        match tokio::time::timeout_at(self.at, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Failure::Remote(err)),
            Err(_) => Err(Failure::DeadlineExceeded),
        }
    }

    /// Runs one remote call. A failure is logged and named after `action`.
    pub async fn run<T, F>(&self, action: &str, call: F) -> Result<T>
    where
        F: Future<Output = asvec_client::Result<T>>,
    {
        self.call(call).await.map_err(|failure| {
            tracing::error!(action, error = %failure, "remote call failed");
            self.surface(action, failure)
        })
    }

    /// Turns a failure into the error reported to the user.
    pub fn surface(&self, action: &str, failure: Failure) -> CliError {
        match failure {
            Failure::Remote(source) => CliError::remote(action, source),
            Failure::DeadlineExceeded => CliError::Timeout {
                operation: action.to_string(),
                timeout: self.timeout,
            },
        }
    }
}

/// Opens a client for `config`, bounded by the configured timeout.
///
/// The caller owns the returned client and must `close` it on every path.
pub async fn connect(
    config: &ClientConfig,
    credentials: Option<Credentials>,
    connector: &dyn Connector,
) -> Result<Arc<dyn AdminClient>> {
    let options = ConnectOptions {
        endpoint: config.endpoint.clone(),
        listener_name: config.listener_name.clone(),
        credentials,
        tls: config.tls.clone(),
        timeout: config.timeout,
    };
    let endpoint = config.endpoint.to_string();
    tracing::debug!(
        %endpoint,
        load_balancer = config.is_load_balancer(),
        listener = ?config.listener_name,
        tls = config.tls.is_some(),
        "connecting"
    );

    let source = match tokio::time::timeout(config.timeout, connector.connect(&options)).await {
        Ok(Ok(client)) => return Ok(client),
        Ok(Err(err)) => err,
        Err(_) => ClientError::Connect {
            endpoint: endpoint.clone(),
            reason: format!("no connection within {:?}", config.timeout),
        },
    };
    tracing::error!(%endpoint, error = %source, "failed to connect");
    Err(CliError::Connect { endpoint, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Env, resolve};
    use crate::flags::{ClientArgs, Seeds, parse_host_port};
    use asvec_client::Code;
    use asvec_client::memory::{MemoryCluster, Request};

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let deadline = Deadline::after(Duration::from_secs(1));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ClientError>(())
        };

        let err = deadline.run("Failed to list indexes", slow).await.unwrap_err();

        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(err.to_string().starts_with("Failed to list indexes"));
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_message() {
        let deadline = Deadline::after(Duration::from_secs(1));
        let failing = async {
            Err::<(), _>(ClientError::status(Code::AlreadyExists, "index test.a already exists"))
        };

        let err = deadline.run("Failed to create index test.a", failing).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to create index test.a: AlreadyExists: index test.a already exists"
        );
    }

    #[tokio::test]
    async fn test_connect_seed_mode() {
        let cluster = MemoryCluster::new();
        cluster.add_node(1, "localhost", 10000);
        let args = ClientArgs {
            seeds: Some(Seeds(vec![parse_host_port("localhost:10000").unwrap()])),
            ..ClientArgs::default()
        };
        let config = resolve(&args, &Env::default()).unwrap();

        let client = connect(&config, None, &cluster).await.unwrap();
        client.close().await;

        assert!(matches!(cluster.requests()[0], Request::Connect { .. }));
        assert_eq!(cluster.open_clients(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure_names_endpoint() {
        let cluster = MemoryCluster::new();
        let config = resolve(&ClientArgs::default(), &Env::default()).unwrap();

        let err = connect(&config, None, &cluster).await.err().unwrap();

        assert!(matches!(err, CliError::Connect { .. }));
        assert!(err.to_string().contains("127.0.0.1:5000"));
    }
}
