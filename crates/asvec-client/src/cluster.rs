//! Node identity, endpoints and clustering facts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A cluster node identifier.
///
/// Id `0` never names a real node. It stands for "whichever node answered"
/// when the client is connected through a load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The synthetic id used behind a load balancer.
    pub const LOAD_BALANCER: Self = Self(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An endpoint a node advertises.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub address: String,
    pub port: u16,
    pub is_tls: bool,
}

impl ServerEndpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            is_tls: false,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// The endpoints a node can see, keyed by node id.
pub type ClusterEndpoints = BTreeMap<NodeId, Vec<ServerEndpoint>>;

/// Cluster membership as reported by one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringState {
    pub is_in_cluster: bool,
    pub cluster_id: u64,
    pub members: Vec<NodeId>,
}

/// Work a node is configured to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeRole {
    IndexQuery,
    IndexUpdate,
    KvRead,
    KvWrite,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IndexQuery => "INDEX_QUERY",
            Self::IndexUpdate => "INDEX_UPDATE",
            Self::KvRead => "KV_READ",
            Self::KvWrite => "KV_WRITE",
        })
    }
}

/// Build information reported by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub version: String,
    pub roles: Vec<NodeRole>,
}
