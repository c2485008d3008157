use crate::config::Options;
use crate::docker::agent::AgentRegistry;
use crate::docker::api::{ClientHandle, Connector, Endpoint};
use crate::docker::client::ClientFactory;
use crate::docker::engine::BollardConnector;
use crate::docker::network::{NetworkNames, NetworkOps};
use crate::docker::topology::{TopologyCache, TopologyLoader, TOPOLOGY_TTL};
use crate::docker::types::Topology;
use crate::metrics::ResolverMetrics;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Entry point for everything that needs to reach the cluster.
///
/// Built once at startup and shared (it is cheap to wrap in an `Arc`); all
/// caches live inside the instance.
pub struct Resolver {
    factory: Arc<ClientFactory>,
    topology: Arc<TopologyCache>,
    agents: AgentRegistry,
    names: NetworkNames,
    networks: NetworkOps,
    metrics: ResolverMetrics,
}

impl Resolver {
    /// Resolver talking to real engines through bollard
    pub fn new(options: &Options) -> Result<Self> {
        Self::with_connector(options, Arc::new(BollardConnector::new()))
    }

    pub fn with_connector(options: &Options, connector: Arc<dyn Connector>) -> Result<Self> {
        Self::with_topology_ttl(options, connector, TOPOLOGY_TTL)
    }

    pub fn with_topology_ttl(
        options: &Options,
        connector: Arc<dyn Connector>,
        ttl: Duration,
    ) -> Result<Self> {
        options.validate()?;
        let metrics = ResolverMetrics::new()?;

        let factory = Arc::new(ClientFactory::new(
            connector,
            Endpoint::from_option(options.docker_endpoint.as_deref()),
            options.docker_api_version.clone(),
        ));

        let loader =
            TopologyLoader::new(factory.clone(), options.agents.clone(), metrics.clone());
        let topology = Arc::new(TopologyCache::with_ttl(loader, ttl));

        debug!(
            endpoint = %factory.endpoint(),
            api_version = %factory.api_version(),
            agents = options.agents.len(),
            topology_ttl_secs = topology.ttl().as_secs(),
            "Resolver configured"
        );

        Ok(Self {
            agents: AgentRegistry::new(factory.clone(), topology.clone(), metrics.clone()),
            names: NetworkNames::new(factory.clone(), metrics.clone()),
            networks: NetworkOps::new(factory.clone()),
            factory,
            topology,
            metrics,
        })
    }

    /// Client bound to the swarm manager
    pub async fn primary_client(&self) -> Result<ClientHandle> {
        self.factory.primary().await
    }

    /// Client for node-scoped requests; the manager unless the node runs an agent
    pub async fn agent_client(&self, node_id: &str) -> Result<ClientHandle> {
        self.agents.client(node_id).await
    }

    pub async fn topology(&self) -> Result<Arc<Topology>> {
        self.topology.topology().await
    }

    /// Snapshot from the last successful load, kept across failed refreshes
    pub fn last_known_topology(&self) -> Option<Arc<Topology>> {
        self.topology.last_known()
    }

    pub async fn network_names<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<HashMap<String, String>> {
        self.names.resolve(ids).await
    }

    pub fn networks(&self) -> &NetworkOps {
        &self.networks
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }
}
