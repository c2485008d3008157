use crate::docker::api::SwarmNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Node id used by callers that do not target a specific node
pub const NO_NODE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Unknown,
    Down,
    Ready,
    Disconnected,
}

impl NodeState {
    pub fn from_backend(state: &str) -> Self {
        match state {
            "down" => NodeState::Down,
            "ready" => NodeState::Ready,
            "disconnected" => NodeState::Disconnected,
            _ => NodeState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Unknown => "unknown",
            NodeState::Down => "down",
            NodeState::Ready => "ready",
            NodeState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub state: NodeState,
    /// `host:port` of the node agent, empty when the node runs none
    pub agent: String,
}

impl Node {
    pub fn from_swarm_node(node: &SwarmNode) -> Self {
        let name = if node.spec_name.is_empty() {
            node.hostname.clone()
        } else {
            node.spec_name.clone()
        };

        Self {
            id: node.id.clone(),
            name,
            state: NodeState::from_backend(&node.state),
            agent: String::new(),
        }
    }

    pub fn has_agent(&self) -> bool {
        !self.agent.is_empty()
    }
}

/// Snapshot of the swarm's nodes produced by one topology load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topology {
    nodes: BTreeMap<String, Node>,
}

impl Topology {
    /// Join listed nodes with the agent addresses discovered in the same load
    pub fn merge(nodes: &[SwarmNode], agents: &HashMap<String, String>) -> Self {
        let nodes = nodes
            .iter()
            .map(|n| {
                let mut node = Node::from_swarm_node(n);
                if let Some(agent) = agents.get(&node.id) {
                    node.agent = agent.clone();
                }
                (node.id.clone(), node)
            })
            .collect();

        Self { nodes }
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Agent address for a node; `None` if the node is unknown or has no agent
    pub fn agent(&self, node_id: &str) -> Option<&str> {
        self.get(node_id)
            .filter(|n| n.has_agent())
            .map(|n| n.agent.as_str())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<Node> for Topology {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }
}
