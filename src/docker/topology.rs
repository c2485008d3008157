//! Swarm topology discovery
//!
//! A load runs agent discovery first, then lists nodes and joins the two.
//! Each successful load replaces the whole snapshot; nothing is merged with
//! earlier loads. [`TopologyCache`] keeps the snapshot for a fixed window and
//! collapses concurrent refreshes into one load.

use crate::cache::CachedValue;
use crate::config::AgentSpec;
use crate::docker::api::{DockerApi, SwarmTask};
use crate::docker::client::ClientFactory;
use crate::docker::types::Topology;
use crate::metrics::ResolverMetrics;
use crate::{Result, SwirlError};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const TOPOLOGY_TTL: Duration = Duration::from_secs(30 * 60);
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Address of the agent a task runs, taken from its first network attachment
pub fn task_agent_address(task: &SwarmTask, port: u16) -> Option<String> {
    let address = task.attachments.first()?.addresses.first()?;
    let ip = address.split('/').next().unwrap_or(address);
    if ip.is_empty() {
        return None;
    }
    Some(format!("{}:{}", ip, port))
}

/// Fold agent tasks into `node id -> host:port`; later tasks overwrite earlier ones
pub fn collect_agents<'a, I>(agents: &mut HashMap<String, String>, tasks: I, port: u16)
where
    I: IntoIterator<Item = &'a SwarmTask>,
{
    for task in tasks {
        if let Some(address) = task_agent_address(task, port) {
            agents.insert(task.node_id.clone(), address);
        }
    }
}

pub struct TopologyLoader {
    factory: Arc<ClientFactory>,
    agents: Vec<AgentSpec>,
    timeout: Duration,
    metrics: ResolverMetrics,
}

impl TopologyLoader {
    pub fn new(
        factory: Arc<ClientFactory>,
        agents: Vec<AgentSpec>,
        metrics: ResolverMetrics,
    ) -> Self {
        Self {
            factory,
            agents,
            timeout: LOAD_TIMEOUT,
            metrics,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn load(&self) -> Result<Topology> {
        self.metrics.topology_loads.inc();

        let result = self.load_inner().await;
        if let Err(e) = &result {
            self.metrics.topology_load_failures.inc();
            warn!(error = %e, "Topology load failed");
        }
        result
    }

    async fn load_inner(&self) -> Result<Topology> {
        let client = self.factory.primary().await?;
        let started = Instant::now();
        let deadline = started + self.timeout;

        let topology = self.load_with(client.as_ref(), deadline).await?;
        info!(
            nodes = topology.len(),
            agents = topology.nodes().filter(|n| n.has_agent()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded swarm topology"
        );
        Ok(topology)
    }

    /// Both steps share one deadline; only agent discovery failures are wrapped.
    async fn load_with(&self, client: &dyn DockerApi, deadline: Instant) -> Result<Topology> {
        let agents = tokio::time::timeout_at(deadline, self.load_agents(client))
            .await
            .unwrap_or_else(|_| Err(self.timed_out("discovering node agents")))
            .map_err(|e| SwirlError::LoadAgents(Box::new(e)))?;

        let nodes = tokio::time::timeout_at(deadline, client.list_nodes())
            .await
            .unwrap_or_else(|_| Err(self.timed_out("listing swarm nodes")))?;

        Ok(Topology::merge(&nodes, &agents))
    }

    fn timed_out(&self, operation: &'static str) -> SwirlError {
        SwirlError::Timeout {
            operation,
            elapsed: self.timeout,
        }
    }

    async fn load_agents(&self, client: &dyn DockerApi) -> Result<HashMap<String, String>> {
        let mut agents = HashMap::new();

        for spec in &self.agents {
            let tasks = client.list_tasks(&spec.service).await?;
            debug!(
                service = %spec.service,
                tasks = tasks.len(),
                "Listed running agent tasks"
            );
            collect_agents(&mut agents, &tasks, spec.port);
        }

        Ok(agents)
    }
}

/// Topology snapshot kept for [`TOPOLOGY_TTL`] after each successful load
pub struct TopologyCache {
    value: CachedValue<Topology>,
}

impl TopologyCache {
    pub fn new(loader: TopologyLoader) -> Self {
        Self::with_ttl(loader, TOPOLOGY_TTL)
    }

    pub fn with_ttl(loader: TopologyLoader, ttl: Duration) -> Self {
        let loader = Arc::new(loader);
        let value = CachedValue::new(ttl, move || {
            let loader = loader.clone();
            async move { loader.load().await }.boxed()
        });
        Self { value }
    }

    pub fn ttl(&self) -> Duration {
        self.value.ttl()
    }

    pub async fn topology(&self) -> Result<Arc<Topology>> {
        self.value.get().await
    }

    /// Snapshot from the last successful load, even if expired
    pub fn last_known(&self) -> Option<Arc<Topology>> {
        self.value.last_known()
    }

    /// Agent address for `node_id`, `None` when the node has no agent
    pub async fn agent_address(&self, node_id: &str) -> Result<Option<String>> {
        let topology = self.topology().await?;
        Ok(topology.agent(node_id).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::api::NetworkAttachment;

    fn task(node_id: &str, addresses: &[&str]) -> SwarmTask {
        SwarmTask {
            id: format!("task-{}", node_id),
            node_id: node_id.to_string(),
            attachments: if addresses.is_empty() {
                Vec::new()
            } else {
                vec![NetworkAttachment {
                    addresses: addresses.iter().map(|a| a.to_string()).collect(),
                }]
            },
        }
    }

    #[test]
    fn test_task_address_strips_subnet() {
        let t = task("A", &["10.0.0.5/24", "10.0.0.6/24"]);
        assert_eq!(task_agent_address(&t, 2375).as_deref(), Some("10.0.0.5:2375"));

        let bare = task("A", &["10.0.0.7"]);
        assert_eq!(task_agent_address(&bare, 9000).as_deref(), Some("10.0.0.7:9000"));
    }

    #[test]
    fn test_task_without_attachment_is_skipped() {
        assert_eq!(task_agent_address(&task("A", &[]), 2375), None);

        let empty = SwarmTask {
            attachments: vec![NetworkAttachment::default()],
            ..task("A", &[])
        };
        assert_eq!(task_agent_address(&empty, 2375), None);
    }

    #[test]
    fn test_last_task_wins_per_node() {
        let mut agents = HashMap::new();
        collect_agents(
            &mut agents,
            &[task("A", &["10.0.0.5/24"]), task("B", &[])],
            2375,
        );
        collect_agents(&mut agents, &[task("A", &["10.0.1.9/24"])], 2376);

        assert_eq!(agents.get("A").map(String::as_str), Some("10.0.1.9:2376"));
        assert!(!agents.contains_key("B"));
    }
}
