//! Per-node fact gathering and visibility diagnostics for `node ls`.
//!
//! Every node the client discovered is asked for four facts concurrently.
//! A failed fact is logged and left unknown; it never aborts the listing.
//! The collected maps are then compared to find nodes the client cannot
//! reach and nodes that cannot see each other.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use asvec_client::{About, AdminClient, ClusterEndpoints, ClusteringState, NodeId, ServerEndpoint};
use tokio::task::JoinSet;

use crate::bootstrap::{Deadline, Failure};
use crate::error::Result;
use crate::view::View;

/// Everything learned about one node. `None` marks a fact that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFacts {
    pub id: NodeId,
    pub endpoint: Option<ServerEndpoint>,
    pub cluster_endpoints: Option<ClusterEndpoints>,
    pub clustering: Option<ClusteringState>,
    pub about: Option<About>,
}

/// Nodes that are missing from someone's view of the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    /// Known to some node but not reached by the client, ascending.
    pub not_visible_to_client: Vec<NodeId>,
    /// Per node, the known nodes it does not report, ascending.
    pub not_visible_to_node: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Visibility {
    pub fn is_empty(&self) -> bool {
        self.not_visible_to_client.is_empty() && self.not_visible_to_node.is_empty()
    }
}

/// Asks every discovered node for its facts.
///
/// Behind a load balancer the node list is empty, so a single synthetic
/// node is queried through whichever node answers.
pub async fn gather(
    client: Arc<dyn AdminClient>,
    deadline: Deadline,
    listener_name: Option<String>,
    load_balanced: bool,
) -> Result<Vec<NodeFacts>> {
    let mut ids = deadline.run("Failed to get node ids", client.node_ids()).await?;
    if ids.is_empty() && load_balanced {
        ids.push(NodeId::LOAD_BALANCER);
    }
    tracing::debug!(nodes = ids.len(), load_balanced, "gathering node facts");

    let mut tasks = JoinSet::new();
    for id in ids {
        let client = Arc::clone(&client);
        let listener_name = listener_name.clone();
        tasks.spawn(async move {
            let target = (id != NodeId::LOAD_BALANCER).then_some(id);
            let (endpoint, cluster_endpoints, clustering, about) = tokio::join!(
                deadline.call(client.connected_node_endpoint(target)),
                deadline.call(client.cluster_endpoints(target, listener_name.as_deref())),
                deadline.call(client.clustering_state(target)),
                deadline.call(client.about(target)),
            );
            NodeFacts {
                id,
                endpoint: fact(id, "connected endpoint", endpoint),
                cluster_endpoints: fact(id, "cluster endpoints", cluster_endpoints),
                clustering: fact(id, "clustering state", clustering),
                about: fact(id, "about", about),
            }
        });
    }

    let mut nodes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        nodes.push(joined.map_err(anyhow::Error::from)?);
    }
    nodes.sort_by_key(|node| node.id);
    Ok(nodes)
}

fn fact<T>(node: NodeId, name: &str, result: std::result::Result<T, Failure>) -> Option<T> {
    result
        .inspect_err(|error| tracing::error!(%node, fact = name, %error, "failed to get node fact"))
        .ok()
}

/// Compares what the client reached with what each node reports.
pub fn analyze(nodes: &[NodeFacts]) -> Visibility {
    let known: BTreeSet<NodeId> = nodes
        .iter()
        .filter_map(|node| node.cluster_endpoints.as_ref())
        .flat_map(|endpoints| endpoints.keys().copied())
        .collect();
    let reached: BTreeSet<NodeId> = nodes
        .iter()
        .filter(|node| node.endpoint.is_some())
        .map(|node| node.id)
        .collect();

    let mut visibility = Visibility {
        not_visible_to_client: known.difference(&reached).copied().collect(),
        ..Visibility::default()
    };
    for node in nodes {
        let Some(endpoints) = &node.cluster_endpoints else {
            continue;
        };
        let missing: Vec<NodeId> = known
            .iter()
            .filter(|id| **id != node.id && !endpoints.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            visibility.not_visible_to_node.insert(node.id, missing);
        }
    }
    visibility
}

/// Prints the visibility warnings. The client warning is skipped behind a
/// load balancer, where unreachable ids are expected.
pub fn warn(view: &mut View, visibility: &Visibility, load_balanced: bool) {
    if !visibility.not_visible_to_client.is_empty() && !load_balanced {
        view.warning(format!(
            "Not all nodes are visible to asvec. \nAsvec can't reach: {}\n\
             Possible scenarios:\n\
             1. You should use --seeds instead of --host to discover the whole cluster.\n\
             2. The node(s) advertise an endpoint asvec can't reach. Try --listener-name.",
            join(&visibility.not_visible_to_client)
        ));
    }
    if !visibility.not_visible_to_node.is_empty() {
        let lines: Vec<String> = visibility
            .not_visible_to_node
            .iter()
            .map(|(node, missing)| format!("Node {node} can't see: {}", join(missing)))
            .collect();
        view.warning(format!(
            "Not all nodes are visible to each other. This may be expected while the \
             cluster is forming.\n{}",
            lines.join("\n")
        ));
    }
}

fn join(ids: &[NodeId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use asvec_client::memory::{Fact, MemoryCluster};
    use asvec_client::{ConnectOptions, Connector, Endpoint, HostPort};

    use crate::view::SharedBuffer;

    fn facts(id: u64, sees: &[u64], reached: bool) -> NodeFacts {
        NodeFacts {
            id: NodeId(id),
            endpoint: reached.then(|| ServerEndpoint::new("10.0.0.1", 5000)),
            cluster_endpoints: Some(
                sees.iter()
                    .map(|peer| (NodeId(*peer), vec![ServerEndpoint::new("10.0.0.1", 5000)]))
                    .collect(),
            ),
            clustering: None,
            about: None,
        }
    }

    #[test]
    fn test_unreached_nodes_sorted() {
        let nodes = vec![facts(1, &[1, 10, 3, 2], true)];
        let visibility = analyze(&nodes);
        assert_eq!(
            visibility.not_visible_to_client,
            vec![NodeId(2), NodeId(3), NodeId(10)]
        );
        assert!(visibility.not_visible_to_node.is_empty());
    }

    #[test]
    fn test_asymmetric_visibility() {
        let nodes = vec![facts(1, &[1, 2, 3], true), facts(2, &[1, 2], true), facts(3, &[1, 2, 3], true)];
        let visibility = analyze(&nodes);
        assert!(visibility.not_visible_to_client.is_empty());
        assert_eq!(
            visibility.not_visible_to_node,
            BTreeMap::from([(NodeId(2), vec![NodeId(3)])])
        );
    }

    #[test]
    fn test_warning_suppressed_behind_load_balancer() {
        let visibility = Visibility {
            not_visible_to_client: vec![NodeId(2)],
            ..Visibility::default()
        };
        let (out, err) = (SharedBuffer::new(), SharedBuffer::new());

        let mut view = View::captured(&out, &err);
        warn(&mut view, &visibility, true);
        assert_eq!(err.contents(), "");

        warn(&mut view, &visibility, false);
        assert!(err.contents().contains("Not all nodes are visible to asvec"));
        assert!(err.contents().contains("Asvec can't reach: 2"));
    }

    #[tokio::test]
    async fn test_gather_degrades_failed_facts() {
        let cluster = MemoryCluster::new();
        cluster.add_node(1, "10.0.0.1", 5000);
        cluster.add_node(2, "10.0.0.2", 5000);
        cluster.fail(2, Fact::About);

        let options = ConnectOptions::new(Endpoint::Seeds(vec![HostPort::new("10.0.0.1", 5000)]));
        let client = cluster.connect(&options).await.unwrap();
        let nodes = gather(client, Deadline::after(Duration::from_secs(5)), None, false)
            .await
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, NodeId(1));
        assert!(nodes[0].about.is_some());
        assert!(nodes[1].about.is_none());
        assert!(nodes[1].clustering.is_some());
    }

    #[tokio::test]
    async fn test_gather_load_balancer_uses_synthetic_node() {
        let cluster = MemoryCluster::standalone();
        let options = ConnectOptions::new(Endpoint::LoadBalancer(HostPort::new("127.0.0.1", 5000)));
        let client = cluster.connect(&options).await.unwrap();
        let nodes = gather(client, Deadline::after(Duration::from_secs(5)), None, true)
            .await
            .unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, NodeId::LOAD_BALANCER);
        assert!(nodes[0].endpoint.is_some());
    }
}
