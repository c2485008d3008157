//! Backend seam between the resolver and a Docker engine or swarm manager

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Shared handle to one engine endpoint. Identity is `Arc::ptr_eq`.
pub type ClientHandle = Arc<dyn DockerApi>;

/// Where a client connects to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Resolved from `DOCKER_HOST`, else the local socket.
    Default,
    Host(String),
}

impl Endpoint {
    pub fn from_option(host: Option<&str>) -> Self {
        match host {
            Some(host) => Endpoint::Host(host.to_string()),
            None => Endpoint::Default,
        }
    }

    /// Endpoint of a node agent reachable at `host:port`
    pub fn agent(address: &str) -> Self {
        Endpoint::Host(format!("tcp://{}", address))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Default => f.write_str("<default>"),
            Endpoint::Host(host) => f.write_str(host),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAttachment {
    /// CIDR-suffixed addresses, e.g. `10.0.0.5/24`
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmTask {
    pub id: String,
    pub node_id: String,
    pub attachments: Vec<NetworkAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmNode {
    pub id: String,
    pub spec_name: String,
    pub hostname: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkCreated {
    pub id: String,
    pub warning: Option<String>,
}

/// The engine queries the resolver and its network pass-throughs rely on
#[async_trait]
pub trait DockerApi: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Tasks with `desired-state=running` belonging to `service`
    async fn list_tasks(&self, service: &str) -> Result<Vec<SwarmTask>>;

    async fn list_nodes(&self) -> Result<Vec<SwarmNode>>;

    async fn inspect_network(&self, id: &str) -> Result<NetworkSummary>;

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    async fn create_network(&self, name: &str, driver: &str) -> Result<NetworkCreated>;

    async fn remove_network(&self, name: &str) -> Result<()>;

    async fn disconnect_network(&self, network: &str, container: &str) -> Result<()>;
}

/// Builds clients bound to an endpoint with a pinned API version
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint, api_version: &str) -> Result<ClientHandle>;
}
