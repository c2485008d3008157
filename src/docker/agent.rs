//! Per-node agent clients
//!
//! Node-scoped requests go to the engine running on that node when the node
//! runs an agent, otherwise to the manager. Each node gets at most one agent
//! client construction for the life of the registry. A failed construction is
//! remembered and returned to every later caller for that node until
//! [`AgentRegistry::evict`] is called, so a transient network failure at first
//! contact needs an operator restart or eviction to recover.

use crate::docker::api::{ClientHandle, Endpoint};
use crate::docker::client::ClientFactory;
use crate::docker::topology::TopologyCache;
use crate::docker::types::NO_NODE;
use crate::metrics::ResolverMetrics;
use crate::{Result, SwirlError};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

struct AgentClient {
    address: String,
    client: std::result::Result<ClientHandle, Arc<SwirlError>>,
}

pub struct AgentRegistry {
    factory: Arc<ClientFactory>,
    topology: Arc<TopologyCache>,
    slots: DashMap<String, Arc<OnceCell<AgentClient>>>,
    metrics: ResolverMetrics,
}

impl AgentRegistry {
    pub fn new(
        factory: Arc<ClientFactory>,
        topology: Arc<TopologyCache>,
        metrics: ResolverMetrics,
    ) -> Self {
        Self {
            factory,
            topology,
            slots: DashMap::new(),
            metrics,
        }
    }

    /// Client for `node_id`: its agent if it has one, the manager otherwise
    pub async fn client(&self, node_id: &str) -> Result<ClientHandle> {
        if node_id.is_empty() || node_id == NO_NODE {
            return self.factory.primary().await;
        }

        let address = match self.topology.agent_address(node_id).await {
            Ok(address) => address,
            Err(e) => {
                error!(node = %node_id, error = %e, "Failed to find node agent");
                None
            }
        };

        let Some(address) = address else {
            debug!(node = %node_id, "No agent for node, using manager");
            self.metrics.agent_fallbacks.inc();
            return self.factory.primary().await;
        };

        let slot = self
            .slots
            .entry(node_id.to_string())
            .or_default()
            .value()
            .clone();

        let agent = slot
            .get_or_init(|| async {
                self.metrics.agent_clients_built.inc();

                let client = self
                    .factory
                    .connect(&Endpoint::agent(&address))
                    .map_err(Arc::new);

                match &client {
                    Ok(_) => info!(node = %node_id, address = %address, "Created agent client"),
                    Err(e) => error!(
                        node = %node_id,
                        address = %address,
                        error = %e,
                        "Failed to create agent client"
                    ),
                }

                AgentClient {
                    address: address.clone(),
                    client,
                }
            })
            .await;

        agent
            .client
            .clone()
            .map_err(|source| SwirlError::AgentUnavailable {
                node: node_id.to_string(),
                address: agent.address.clone(),
                source,
            })
    }

    /// Forget the memoized client or failure for a node
    pub fn evict(&self, node_id: &str) -> bool {
        self.slots.remove(node_id).is_some()
    }

    /// Number of nodes with a memoized agent client or failure
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
