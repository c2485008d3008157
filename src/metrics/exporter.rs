use crate::metrics::collector::ResolverMetrics;
use crate::Result;
use prometheus::{Encoder, TextEncoder};

pub struct PrometheusExporter {
    metrics: ResolverMetrics,
}

impl PrometheusExporter {
    pub fn new(metrics: ResolverMetrics) -> Self {
        Self { metrics }
    }

    /// Render all resolver metrics in the Prometheus text exposition format
    pub fn format_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.metrics.registry().gather();

        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
