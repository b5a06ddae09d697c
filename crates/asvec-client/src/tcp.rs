//! The network connector used by the `asvec` binary.
//!
//! [`TcpConnector`] dials the load balancer or each seed in turn, bounded
//! by the connect timeout. Reaching a node only proves the address is
//! live: this crate carries no wire codec for the service, so a reachable
//! endpoint is still reported as a [`ClientError::Connect`] naming the node
//! that answered.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::client::{AdminClient, Connector};
use crate::connect::{ConnectOptions, Endpoint, HostPort};
use crate::error::{ClientError, Result};

/// Dials cluster nodes over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

async fn dial(target: &HostPort, options: &ConnectOptions) -> std::result::Result<TcpStream, String> {
    let dial = TcpStream::connect((target.host.as_str(), target.port));
    match tokio::time::timeout(options.timeout, dial).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {:?}", options.timeout)),
    }
}

fn targets(endpoint: &Endpoint) -> &[HostPort] {
    match endpoint {
        Endpoint::LoadBalancer(host) => std::slice::from_ref(host),
        Endpoint::Seeds(seeds) => seeds,
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn AdminClient>> {
        let endpoint = options.endpoint.to_string();
        let mut failures = Vec::new();
        for target in targets(&options.endpoint) {
            match dial(target, options).await {
                Ok(stream) => {
                    let peer = stream.peer_addr().map_or_else(|_| target.to_string(), |a| a.to_string());
                    tracing::debug!(%target, %peer, tls = options.tls.is_some(), "node reachable");
                    return Err(ClientError::Connect {
                        endpoint,
                        reason: format!("{target} accepted the connection but no protocol client is built in"),
                    });
                }
                Err(reason) => {
                    tracing::debug!(%target, %reason, "dial failed");
                    failures.push(format!("{target}: {reason}"));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no hosts given".to_string());
        }
        Err(ClientError::Connect {
            endpoint,
            reason: failures.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn options(endpoint: Endpoint) -> ConnectOptions {
        ConnectOptions {
            endpoint,
            listener_name: None,
            credentials: None,
            tls: None,
            timeout: Duration::from_secs(2),
        }
    }

    /// A local port with nothing listening on it.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        let port = closed_port().await;
        let endpoint = Endpoint::LoadBalancer(HostPort::new("127.0.0.1", port));
        let err = match TcpConnector::new().connect(&options(endpoint)).await {
            Ok(_) => panic!("connected to a closed port"),
            Err(err) => err,
        };
        match err {
            ClientError::Connect { endpoint, reason } => {
                assert_eq!(endpoint, format!("127.0.0.1:{port}"));
                assert!(reason.starts_with(&format!("127.0.0.1:{port}: ")), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_every_seed_is_tried() {
        let first = closed_port().await;
        let second = closed_port().await;
        let endpoint = Endpoint::Seeds(vec![
            HostPort::new("127.0.0.1", first),
            HostPort::new("127.0.0.1", second),
        ]);
        let Err(ClientError::Connect { reason, .. }) = TcpConnector::new().connect(&options(endpoint)).await else {
            panic!("expected a connect error");
        };
        assert!(reason.contains(&format!(":{first}: ")), "{reason}");
        assert!(reason.contains(&format!(":{second}: ")), "{reason}");
    }

    #[tokio::test]
    async fn test_reachable_node_is_named() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = Endpoint::Seeds(vec![HostPort::new("127.0.0.1", port)]);
        let Err(ClientError::Connect { reason, .. }) = TcpConnector::new().connect(&options(endpoint)).await else {
            panic!("expected a connect error");
        };
        assert!(reason.contains("accepted the connection"), "{reason}");
    }
}
