use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::{AgentSpec, Options};
use crate::docker::types::Topology;
use crate::metrics::PrometheusExporter;
use crate::{Resolver, Result};
use tracing::info;

/// Layer command-line flags over file and environment configuration
pub fn load_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => Options::from_yaml_file(path)?,
        None => Options::from_env()?,
    };

    if let Some(endpoint) = &cli.endpoint {
        options.docker_endpoint = Some(endpoint.clone());
    }
    if let Some(version) = &cli.api_version {
        options.docker_api_version = version.clone();
    }
    if !cli.agents.is_empty() {
        options.agents = cli
            .agents
            .iter()
            .map(|a| AgentSpec::parse(a))
            .collect::<Result<_>>()?;
    }

    options.validate()?;
    Ok(options)
}

pub async fn handle_command(resolver: &Resolver, command: Commands) -> Result<()> {
    match command {
        Commands::Nodes { format } => handle_nodes(resolver, format).await,
        Commands::Agent { node } => handle_agent(resolver, &node).await,
        Commands::Networks { ids } => handle_networks(resolver, ids).await,
        Commands::Metrics => handle_metrics(resolver).await,
    }
}

async fn handle_nodes(resolver: &Resolver, format: OutputFormat) -> Result<()> {
    let topology = resolver.topology().await?;
    info!("Loaded {} nodes", topology.len());

    let output = match format {
        OutputFormat::Table => format_table(&topology),
        OutputFormat::Json => serde_json::to_string_pretty(topology.as_ref())?,
        OutputFormat::Yaml => serde_yaml::to_string(topology.as_ref())?,
    };
    println!("{}", output);
    Ok(())
}

pub fn format_table(topology: &Topology) -> String {
    let mut out = format!(
        "{:<28} {:<24} {:<14} {}\n",
        "ID", "NAME", "STATE", "AGENT"
    );
    for node in topology.nodes() {
        out.push_str(&format!(
            "{:<28} {:<24} {:<14} {}\n",
            node.id,
            node.name,
            node.state,
            if node.has_agent() { node.agent.as_str() } else { "-" }
        ));
    }
    out
}

async fn handle_agent(resolver: &Resolver, node: &str) -> Result<()> {
    let client = resolver.agent_client(node).await?;
    println!("{}", client.endpoint());
    Ok(())
}

async fn handle_networks(resolver: &Resolver, ids: Vec<String>) -> Result<()> {
    if ids.is_empty() {
        for network in resolver.networks().list().await? {
            println!(
                "{:<14} {:<30} {:<10} {}",
                truncate(&network.id, 12),
                network.name,
                network.driver,
                network.scope
            );
        }
        return Ok(());
    }

    let names = resolver.network_names(&ids).await?;
    for id in &ids {
        if let Some(name) = names.get(id) {
            println!("{:<28} {}", id, name);
        }
    }
    Ok(())
}

async fn handle_metrics(resolver: &Resolver) -> Result<()> {
    resolver.topology().await?;
    let exporter = PrometheusExporter::new(resolver.metrics().clone());
    print!("{}", exporter.format_metrics()?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::types::{Node, NodeState};
    use clap::Parser;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "swirl",
            "--endpoint",
            "tcp://manager:2375",
            "--api-version",
            "1.43",
            "--agent",
            "edge-agent:9000",
            "nodes",
        ]);

        let options = load_options(&cli).unwrap();
        assert_eq!(options.docker_endpoint.as_deref(), Some("tcp://manager:2375"));
        assert_eq!(options.docker_api_version, "1.43");
        assert_eq!(options.agents, vec![AgentSpec::new("edge-agent", 9000)]);
    }

    #[test]
    fn test_format_table() {
        let topology: Topology = vec![
            Node {
                id: "A".to_string(),
                name: "alpha".to_string(),
                state: NodeState::Ready,
                agent: "10.0.0.5:2375".to_string(),
            },
            Node {
                id: "B".to_string(),
                name: "beta".to_string(),
                state: NodeState::Down,
                agent: String::new(),
            },
        ]
        .into_iter()
        .collect();

        let table = format_table(&topology);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("alpha") && lines[1].ends_with("10.0.0.5:2375"));
        assert!(lines[2].contains("down") && lines[2].ends_with('-'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("0123456789abcdef", 12), "0123456789ab");
        assert_eq!(truncate("short", 12), "short");
    }
}
