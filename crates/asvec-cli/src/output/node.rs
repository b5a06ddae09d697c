use asvec_client::{ClusterEndpoints, NodeId};

use super::{Cell, Render, RenderMode, TableWriter};
use crate::topology::NodeFacts;

const UNKNOWN: &str = "unknown";

pub struct NodeWriter {
    table: TableWriter,
}

impl NodeWriter {
    pub fn new(color: bool) -> Self {
        let table = TableWriter::new(&[
            "Node",
            "Endpoint",
            "Cluster ID",
            "In Cluster",
            "Version",
            "Roles",
            "Visible Nodes",
        ])
        .with_title("Nodes")
        .with_color(color)
        .sort_by(&["Node"]);
        Self { table }
    }

    pub fn append(&mut self, node: &NodeFacts) {
        let id: Cell = if node.id == NodeId::LOAD_BALANCER {
            "LB".into()
        } else {
            node.id.0.into()
        };
        let (cluster_id, in_cluster) = match &node.clustering {
            Some(state) => (state.cluster_id.into(), state.is_in_cluster.into()),
            None => (UNKNOWN.into(), UNKNOWN.into()),
        };
        let (version, roles) = match &node.about {
            Some(about) => (
                about.version.as_str().into(),
                about
                    .roles
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
                    .into(),
            ),
            None => (UNKNOWN.into(), UNKNOWN.into()),
        };

        self.table.append_row(vec![
            id,
            known(node.endpoint.as_ref().map(ToString::to_string)),
            cluster_id,
            in_cluster,
            version,
            roles,
            known(
                node.cluster_endpoints
                    .as_ref()
                    .map(|endpoints| visible_nodes(node.id, endpoints)),
            ),
        ]);
    }
}

impl Render for NodeWriter {
    fn render(&self, mode: RenderMode) -> String {
        self.table.render(mode)
    }
}

fn known(value: Option<String>) -> Cell {
    value.unwrap_or_else(|| UNKNOWN.to_string()).into()
}

/// The peers a node reports, without itself.
fn visible_nodes(own: NodeId, endpoints: &ClusterEndpoints) -> String {
    let lines: Vec<String> = endpoints
        .iter()
        .filter(|(id, _)| **id != own)
        .map(|(id, list)| {
            let list: Vec<String> = list.iter().map(ToString::to_string).collect();
            format!("  {id}: [{}]", list.join(", "))
        })
        .collect();
    if lines.is_empty() {
        return "{}".to_string();
    }
    format!("{{\n{}\n}}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use asvec_client::{About, ClusteringState, NodeRole, ServerEndpoint};

    fn facts(id: u64) -> NodeFacts {
        let mut endpoints = ClusterEndpoints::new();
        endpoints.insert(NodeId(1), vec![ServerEndpoint::new("10.0.0.1", 5000)]);
        endpoints.insert(NodeId(2), vec![ServerEndpoint::new("10.0.0.2", 5000)]);
        NodeFacts {
            id: NodeId(id),
            endpoint: Some(ServerEndpoint::new(format!("10.0.0.{id}"), 5000)),
            cluster_endpoints: Some(endpoints),
            clustering: Some(ClusteringState {
                is_in_cluster: true,
                cluster_id: 42,
                members: vec![NodeId(1), NodeId(2)],
            }),
            about: Some(About {
                version: "1.0.0".to_string(),
                roles: vec![NodeRole::IndexQuery, NodeRole::KvRead],
            }),
        }
    }

    #[test]
    fn test_node_row() {
        let mut writer = NodeWriter::new(false);
        writer.append(&facts(2));
        writer.append(&facts(1));

        let csv = writer.render(RenderMode::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            ",Node,Endpoint,Cluster ID,In Cluster,Version,Roles,Visible Nodes"
        );
        assert_eq!(
            lines[1],
            "1,1,10.0.0.1:5000,42,true,1.0.0,\"INDEX_QUERY, KV_READ\",\"{"
        );
        assert_eq!(lines[2], "  2: [10.0.0.2:5000]");
        assert_eq!(lines[3], "}\"");
    }

    #[test]
    fn test_load_balancer_and_unknown_facts() {
        let node = NodeFacts {
            id: NodeId::LOAD_BALANCER,
            endpoint: Some(ServerEndpoint::new("127.0.0.1", 5000)),
            cluster_endpoints: None,
            clustering: None,
            about: None,
        };
        let mut writer = NodeWriter::new(false);
        writer.append(&node);

        let csv = writer.render(RenderMode::Csv);
        assert!(
            csv.ends_with("1,LB,127.0.0.1:5000,unknown,unknown,unknown,unknown,unknown"),
            "{csv}"
        );
    }

    #[test]
    fn test_visible_nodes_skips_self() {
        let mut endpoints = ClusterEndpoints::new();
        endpoints.insert(NodeId(1), vec![ServerEndpoint::new("a", 1)]);
        assert_eq!(visible_nodes(NodeId(1), &endpoints), "{}");
    }
}
