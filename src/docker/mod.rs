pub mod agent;
pub mod api;
pub mod client;
pub mod engine;
pub mod network;
pub mod resolver;
pub mod topology;
pub mod types;

pub use agent::AgentRegistry;
pub use api::{ClientHandle, Connector, DockerApi, Endpoint};
pub use client::ClientFactory;
pub use engine::BollardConnector;
pub use network::{NetworkNames, NetworkOps};
pub use resolver::Resolver;
pub use topology::{TopologyCache, TopologyLoader};
pub use types::{Node, NodeState, Topology, NO_NODE};
