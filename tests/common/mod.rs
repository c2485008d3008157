#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swirl::docker::api::{
    ClientHandle, Connector, DockerApi, Endpoint, NetworkAttachment, NetworkCreated,
    NetworkSummary, SwarmNode, SwarmTask,
};
use swirl::{Result, SwirlError};

/// In-memory swarm manager with call counters
#[derive(Default)]
pub struct FakeSwarm {
    pub tasks: Mutex<HashMap<String, Vec<SwarmTask>>>,
    pub nodes: Mutex<Vec<SwarmNode>>,
    pub networks: Mutex<HashMap<String, String>>,
    pub latency: Mutex<Option<Duration>>,
    pub fail_tasks: AtomicBool,
    pub fail_nodes: AtomicBool,
    pub task_calls: AtomicUsize,
    pub node_calls: AtomicUsize,
    pub inspect_calls: Mutex<HashMap<String, usize>>,
}

impl FakeSwarm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_node(&self, id: &str, name: &str, hostname: &str, state: &str) {
        self.nodes.lock().unwrap().push(SwarmNode {
            id: id.to_string(),
            spec_name: name.to_string(),
            hostname: hostname.to_string(),
            state: state.to_string(),
        });
    }

    pub fn add_task(&self, service: &str, node_id: &str, address: &str) {
        self.tasks
            .lock()
            .unwrap()
            .entry(service.to_string())
            .or_default()
            .push(SwarmTask {
                id: format!("{}.{}", service, node_id),
                node_id: node_id.to_string(),
                attachments: vec![NetworkAttachment {
                    addresses: vec![address.to_string()],
                }],
            });
    }

    pub fn add_network(&self, id: &str, name: &str) {
        self.networks
            .lock()
            .unwrap()
            .insert(id.to_string(), name.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn loads(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }

    pub fn inspections(&self, id: &str) -> usize {
        self.inspect_calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Client handle pointing at a [`FakeSwarm`]
pub struct FakeClient {
    pub endpoint: Endpoint,
    pub swarm: Arc<FakeSwarm>,
}

#[async_trait]
impl DockerApi for FakeClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn list_tasks(&self, service: &str) -> Result<Vec<SwarmTask>> {
        self.swarm.task_calls.fetch_add(1, Ordering::SeqCst);
        self.swarm.delay().await;
        if self.swarm.fail_tasks.load(Ordering::SeqCst) {
            return Err(SwirlError::Backend("task listing refused".to_string()));
        }
        Ok(self
            .swarm
            .tasks
            .lock()
            .unwrap()
            .get(service)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_nodes(&self) -> Result<Vec<SwarmNode>> {
        self.swarm.node_calls.fetch_add(1, Ordering::SeqCst);
        self.swarm.delay().await;
        if self.swarm.fail_nodes.load(Ordering::SeqCst) {
            return Err(SwirlError::Backend("node listing refused".to_string()));
        }
        Ok(self.swarm.nodes.lock().unwrap().clone())
    }

    async fn inspect_network(&self, id: &str) -> Result<NetworkSummary> {
        *self
            .swarm
            .inspect_calls
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default() += 1;

        let name = self.swarm.networks.lock().unwrap().get(id).cloned();
        match name {
            Some(name) => Ok(NetworkSummary {
                id: id.to_string(),
                name,
                driver: "overlay".to_string(),
                scope: "swarm".to_string(),
            }),
            None => Err(SwirlError::NetworkNotFound(id.to_string())),
        }
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        Ok(self
            .swarm
            .networks
            .lock()
            .unwrap()
            .iter()
            .map(|(id, name)| NetworkSummary {
                id: id.clone(),
                name: name.clone(),
                driver: "overlay".to_string(),
                scope: "swarm".to_string(),
            })
            .collect())
    }

    async fn create_network(&self, name: &str, _driver: &str) -> Result<NetworkCreated> {
        let id = format!("net-{}", name);
        self.swarm.add_network(&id, name);
        Ok(NetworkCreated { id, warning: None })
    }

    async fn remove_network(&self, name: &str) -> Result<()> {
        let mut networks = self.swarm.networks.lock().unwrap();
        let before = networks.len();
        networks.retain(|id, n| id != name && n != name);
        if networks.len() == before {
            return Err(SwirlError::NetworkNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn disconnect_network(&self, _network: &str, _container: &str) -> Result<()> {
        Ok(())
    }
}

/// Connector handing out [`FakeClient`]s and counting constructions per endpoint
pub struct FakeConnector {
    pub swarm: Arc<FakeSwarm>,
    pub connects: Mutex<HashMap<Endpoint, usize>>,
    pub failing: Mutex<HashSet<Endpoint>>,
}

impl FakeConnector {
    pub fn new(swarm: Arc<FakeSwarm>) -> Arc<Self> {
        Arc::new(Self {
            swarm,
            connects: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &Endpoint) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    pub fn connects(&self, endpoint: &Endpoint) -> usize {
        self.connects
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }
}

impl Connector for FakeConnector {
    fn connect(&self, endpoint: &Endpoint, _api_version: &str) -> Result<ClientHandle> {
        *self
            .connects
            .lock()
            .unwrap()
            .entry(endpoint.clone())
            .or_default() += 1;

        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(SwirlError::Backend(format!("cannot reach {}", endpoint)));
        }

        Ok(Arc::new(FakeClient {
            endpoint: endpoint.clone(),
            swarm: self.swarm.clone(),
        }))
    }
}
