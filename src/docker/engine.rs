//! [`DockerApi`] backed by the bollard Docker Engine client

use crate::cache::CachedValue;
use crate::docker::api::{
    ClientHandle, Connector, DockerApi, Endpoint, NetworkAttachment, NetworkCreated,
    NetworkSummary, SwarmNode, SwarmTask,
};
use crate::docker::topology::LOAD_TIMEOUT;
use crate::{Result, SwirlError};
use async_trait::async_trait;
use bollard::network::{
    CreateNetworkOptions, DisconnectNetworkOptions, InspectNetworkOptions, ListNetworksOptions,
};
use bollard::node::ListNodesOptions;
use bollard::task::ListTasksOptions;
use bollard::{ClientVersion, Docker};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Request timeout handed to bollard, in seconds
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transport {
    Http(String),
    Socket(String),
}

fn transport_for(host: &str) -> Result<Transport> {
    if host.starts_with("tcp://") || host.starts_with("http://") {
        Ok(Transport::Http(host.to_string()))
    } else if host.starts_with("unix://") || host.starts_with('/') {
        Ok(Transport::Socket(host.to_string()))
    } else {
        Err(SwirlError::ConfigError(format!(
            "unsupported Docker host '{}', expected tcp://, http://, unix:// or a socket path",
            host
        )))
    }
}

pub fn parse_api_version(version: &str) -> Result<ClientVersion> {
    let invalid = || SwirlError::ConfigError(format!("invalid Docker API version '{}'", version));

    let (major, minor) = version.trim_start_matches('v').split_once('.').ok_or_else(invalid)?;

    Ok(ClientVersion {
        major_version: major.parse().map_err(|_| invalid())?,
        minor_version: minor.parse().map_err(|_| invalid())?,
    })
}

/// Connects to real engines through bollard
#[derive(Debug, Clone, Default)]
pub struct BollardConnector;

impl BollardConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for BollardConnector {
    fn connect(&self, endpoint: &Endpoint, api_version: &str) -> Result<ClientHandle> {
        let version = parse_api_version(api_version)?;

        let host = match endpoint {
            Endpoint::Host(host) => host.clone(),
            Endpoint::Default => std::env::var("DOCKER_HOST")
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
        };

        debug!(host = %host, api_version, "Creating Docker client");

        let docker = match transport_for(&host)? {
            Transport::Http(addr) => Docker::connect_with_http(&addr, REQUEST_TIMEOUT_SECS, &version)?,
            #[cfg(unix)]
            Transport::Socket(path) => Docker::connect_with_unix(&path, REQUEST_TIMEOUT_SECS, &version)?,
            #[cfg(not(unix))]
            Transport::Socket(path) => {
                return Err(SwirlError::ConfigError(format!(
                    "unix sockets are not supported on this platform: {}",
                    path
                )))
            }
        };

        Ok(Arc::new(BollardClient::new(docker, endpoint.clone())))
    }
}

/// Node id to advertised address, as reported by the manager
async fn fetch_node_addresses(docker: Docker) -> Result<HashMap<String, String>> {
    let nodes = docker.list_nodes(None::<ListNodesOptions<String>>).await?;

    Ok(nodes
        .into_iter()
        .filter_map(|n| Some((n.id?, n.status?.addr?)))
        .filter(|(_, addr)| !addr.is_empty())
        .collect())
}

pub struct BollardClient {
    docker: Docker,
    endpoint: Endpoint,
    /// Kept for one load window so every agent service in a load shares one node listing.
    node_addresses: CachedValue<HashMap<String, String>>,
}

impl BollardClient {
    pub fn new(docker: Docker, endpoint: Endpoint) -> Self {
        let lister = docker.clone();
        let node_addresses = CachedValue::new(LOAD_TIMEOUT, move || {
            fetch_node_addresses(lister.clone()).boxed()
        });

        Self {
            docker,
            endpoint,
            node_addresses,
        }
    }

    fn network_summary(network: bollard::models::Network) -> NetworkSummary {
        NetworkSummary {
            id: network.id.unwrap_or_default(),
            name: network.name.unwrap_or_default(),
            driver: network.driver.unwrap_or_default(),
            scope: network.scope.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DockerApi for BollardClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The engine's task model carries no network attachment addresses, so each
    /// task reports the address its node advertises to the swarm instead.
    async fn list_tasks(&self, service: &str) -> Result<Vec<SwarmTask>> {
        let mut filters = HashMap::new();
        filters.insert("desired-state", vec!["running"]);
        filters.insert("service", vec![service]);

        let tasks = self
            .docker
            .list_tasks(Some(ListTasksOptions { filters }))
            .await?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let addresses = self.node_addresses.get().await?;

        Ok(tasks
            .into_iter()
            .filter_map(|task| {
                let node_id = task.node_id?;
                let attachments = addresses
                    .get(&node_id)
                    .map(|addr| {
                        vec![NetworkAttachment {
                            addresses: vec![addr.clone()],
                        }]
                    })
                    .unwrap_or_default();

                Some(SwarmTask {
                    id: task.id.unwrap_or_default(),
                    node_id,
                    attachments,
                })
            })
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<SwarmNode>> {
        let nodes = self
            .docker
            .list_nodes(None::<ListNodesOptions<String>>)
            .await?;

        Ok(nodes
            .into_iter()
            .map(|n| SwarmNode {
                id: n.id.unwrap_or_default(),
                spec_name: n.spec.and_then(|s| s.name).unwrap_or_default(),
                hostname: n.description.and_then(|d| d.hostname).unwrap_or_default(),
                state: n
                    .status
                    .and_then(|s| s.state)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect_network(&self, id: &str) -> Result<NetworkSummary> {
        let network = self
            .docker
            .inspect_network(id, None::<InspectNetworkOptions<String>>)
            .await?;
        Ok(Self::network_summary(network))
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;
        Ok(networks.into_iter().map(Self::network_summary).collect())
    }

    async fn create_network(&self, name: &str, driver: &str) -> Result<NetworkCreated> {
        let response = self
            .docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                driver: driver.to_string(),
                ..Default::default()
            })
            .await?;

        // The response shape changed across API versions; read it by field name.
        let value = serde_json::to_value(&response)?;
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(NetworkCreated {
            id: field("Id").unwrap_or_default(),
            warning: field("Warning"),
        })
    }

    async fn remove_network(&self, name: &str) -> Result<()> {
        self.docker.remove_network(name).await?;
        Ok(())
    }

    async fn disconnect_network(&self, network: &str, container: &str) -> Result<()> {
        self.docker
            .disconnect_network(
                network,
                DisconnectNetworkOptions {
                    container: container.to_string(),
                    force: false,
                },
            )
            .await?;
        Ok(())
    }
}
