//! The remote admin surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cluster::{About, ClusterEndpoints, ClusteringState, NodeId, ServerEndpoint};
use crate::connect::ConnectOptions;
use crate::error::Result;
use crate::index::{HnswIndexUpdate, IndexDefinition, IndexStatus, Labels};
use crate::record::{Key, Neighbor, Record, Role, SearchParams, User, Vector};

/// Administrative operations against a vector search cluster.
///
/// Clients are shared across tasks during fan-out, so every method takes
/// `&self`. Per-node methods take `None` to mean "the node this client is
/// attached to", which is the only option behind a load balancer.
#[async_trait]
pub trait AdminClient: Send + Sync {
    // Indexes

    async fn index_create(&self, definition: &IndexDefinition) -> Result<()>;

    /// Replaces labels when `labels` is given and applies the set fields of `update`.
    async fn index_update(
        &self,
        namespace: &str,
        name: &str,
        labels: Option<&Labels>,
        update: &HnswIndexUpdate,
    ) -> Result<()>;

    async fn index_drop(&self, namespace: &str, name: &str) -> Result<()>;

    async fn index_list(&self) -> Result<Vec<IndexDefinition>>;

    async fn index_get(&self, namespace: &str, name: &str) -> Result<IndexDefinition>;

    async fn index_status(&self, namespace: &str, name: &str) -> Result<IndexStatus>;

    /// Removes vertices whose records were last updated before `cutoff`.
    async fn gc_invalid_vertices(
        &self,
        namespace: &str,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<()>;

    // Users and roles

    async fn user_create(&self, username: &str, password: &str, roles: &[String]) -> Result<()>;

    async fn user_drop(&self, username: &str) -> Result<()>;

    async fn user_update_credentials(&self, username: &str, password: &str) -> Result<()>;

    async fn user_grant_roles(&self, username: &str, roles: &[String]) -> Result<()>;

    async fn user_revoke_roles(&self, username: &str, roles: &[String]) -> Result<()>;

    async fn user_list(&self) -> Result<Vec<User>>;

    async fn role_list(&self) -> Result<Vec<Role>>;

    // Topology

    /// Nodes this client discovered. Empty behind a load balancer.
    async fn node_ids(&self) -> Result<Vec<NodeId>>;

    /// The endpoint the client is connected to on `node`.
    async fn connected_node_endpoint(&self, node: Option<NodeId>) -> Result<ServerEndpoint>;

    /// The endpoints `node` can see, for the given listener.
    async fn cluster_endpoints(
        &self,
        node: Option<NodeId>,
        listener_name: Option<&str>,
    ) -> Result<ClusterEndpoints>;

    async fn clustering_state(&self, node: Option<NodeId>) -> Result<ClusteringState>;

    async fn about(&self, node: Option<NodeId>) -> Result<About>;

    // Records and search

    /// Reads one record. `fields` restricts the returned bins.
    async fn get_record(
        &self,
        namespace: &str,
        set: Option<&str>,
        key: &Key,
        fields: Option<&[String]>,
    ) -> Result<Record>;

    /// Nearest neighbors of `query`, closest first, at most `limit` of them.
    async fn vector_search(
        &self,
        namespace: &str,
        index_name: &str,
        query: &Vector,
        limit: u32,
        params: &SearchParams,
        include_fields: Option<&[String]>,
    ) -> Result<Vec<Neighbor>>;

    /// Releases the connection. Further calls fail with `Closed`.
    async fn close(&self);
}

/// Opens [`AdminClient`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn AdminClient>>;
}

/// Record data filtered down to `fields`, or all of it when `fields` is `None`.
pub fn project_fields<V: Clone>(
    data: &BTreeMap<String, V>,
    fields: Option<&[String]>,
) -> BTreeMap<String, V> {
    match fields {
        None => data.clone(),
        Some(fields) => data
            .iter()
            .filter(|(name, _)| fields.iter().any(|f| f == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    }
}
