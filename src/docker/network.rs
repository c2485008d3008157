use crate::docker::api::{ClientHandle, NetworkCreated, NetworkSummary};
use crate::docker::client::ClientFactory;
use crate::metrics::ResolverMetrics;
use crate::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Network id to name lookups, cached for the life of the process.
///
/// Network ids never change meaning within a cluster, so entries are never
/// evicted.
pub struct NetworkNames {
    factory: Arc<ClientFactory>,
    names: DashMap<String, String>,
    metrics: ResolverMetrics,
}

impl NetworkNames {
    pub fn new(factory: Arc<ClientFactory>, metrics: ResolverMetrics) -> Self {
        Self {
            factory,
            names: DashMap::new(),
            metrics,
        }
    }

    /// Resolve names for `ids`. Any failed lookup fails the whole call, but
    /// names resolved before the failure stay cached.
    pub async fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<HashMap<String, String>> {
        let mut client: Option<ClientHandle> = None;
        let mut names = HashMap::with_capacity(ids.len());

        for id in ids {
            let id = id.as_ref();

            let cached = self.names.get(id).map(|name| name.value().clone());
            if let Some(name) = cached {
                self.metrics.record_network_lookup(true);
                names.insert(id.to_string(), name);
                continue;
            }
            self.metrics.record_network_lookup(false);

            let c = match &client {
                Some(c) => c.clone(),
                None => {
                    let c = self.factory.primary().await?;
                    client = Some(c.clone());
                    c
                }
            };

            let network = c.inspect_network(id).await?;
            debug!(id, name = %network.name, "Resolved network name");

            self.names.insert(id.to_string(), network.name.clone());
            names.insert(id.to_string(), network.name);
        }

        Ok(names)
    }
}

/// Network operations issued against the manager
pub struct NetworkOps {
    factory: Arc<ClientFactory>,
}

impl NetworkOps {
    pub fn new(factory: Arc<ClientFactory>) -> Self {
        Self { factory }
    }

    /// All networks, sorted by name
    pub async fn list(&self) -> Result<Vec<NetworkSummary>> {
        let client = self.factory.primary().await?;
        let mut networks = client.list_networks().await?;
        networks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(networks)
    }

    pub async fn count(&self) -> Result<usize> {
        let client = self.factory.primary().await?;
        Ok(client.list_networks().await?.len())
    }

    pub async fn inspect(&self, id: &str) -> Result<NetworkSummary> {
        let client = self.factory.primary().await?;
        client.inspect_network(id).await
    }

    pub async fn create(&self, name: &str, driver: &str) -> Result<NetworkCreated> {
        let client = self.factory.primary().await?;
        let created = client.create_network(name, driver).await?;
        if let Some(warning) = &created.warning {
            warn!(network = %name, warning = %warning, "Network was created with a warning");
        }
        Ok(created)
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let client = self.factory.primary().await?;
        client.remove_network(name).await
    }

    pub async fn disconnect(&self, network: &str, container: &str) -> Result<()> {
        let client = self.factory.primary().await?;
        client.disconnect_network(network, container).await
    }
}
