pub mod collector;
pub mod exporter;

pub use collector::ResolverMetrics;
pub use exporter::PrometheusExporter;
