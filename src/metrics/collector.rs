use crate::Result;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Counters describing how the resolver reaches the cluster
#[derive(Clone)]
pub struct ResolverMetrics {
    registry: Registry,
    pub topology_loads: IntCounter,
    pub topology_load_failures: IntCounter,
    pub agent_clients_built: IntCounter,
    pub agent_fallbacks: IntCounter,
    pub network_name_lookups: IntCounterVec,
}

impl ResolverMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let topology_loads = IntCounter::new(
            "swirl_topology_loads_total",
            "Topology loads issued against the swarm manager",
        )?;
        let topology_load_failures = IntCounter::new(
            "swirl_topology_load_failures_total",
            "Topology loads that returned an error",
        )?;
        let agent_clients_built = IntCounter::new(
            "swirl_agent_clients_built_total",
            "Node agent client constructions attempted",
        )?;
        let agent_fallbacks = IntCounter::new(
            "swirl_agent_fallbacks_total",
            "Node-scoped requests routed to the manager instead of an agent",
        )?;
        let network_name_lookups = IntCounterVec::new(
            Opts::new(
                "swirl_network_name_lookups_total",
                "Network name lookups by cache result",
            ),
            &["result"],
        )?;

        registry.register(Box::new(topology_loads.clone()))?;
        registry.register(Box::new(topology_load_failures.clone()))?;
        registry.register(Box::new(agent_clients_built.clone()))?;
        registry.register(Box::new(agent_fallbacks.clone()))?;
        registry.register(Box::new(network_name_lookups.clone()))?;

        Ok(Self {
            registry,
            topology_loads,
            topology_load_failures,
            agent_clients_built,
            agent_fallbacks,
            network_name_lookups,
        })
    }

    pub fn record_network_lookup(&self, cached: bool) {
        let result = if cached { "hit" } else { "miss" };
        self.network_name_lookups.with_label_values(&[result]).inc();
    }

    pub fn network_lookups(&self, cached: bool) -> u64 {
        let result = if cached { "hit" } else { "miss" };
        self.network_name_lookups.with_label_values(&[result]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
