pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "swirl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve swarm nodes to their manager or agent endpoints", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "SWIRL_DOCKER_ENDPOINT",
        help = "Swarm manager endpoint (defaults to DOCKER_HOST)"
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        global = true,
        env = "SWIRL_DOCKER_API_VERSION",
        help = "Pinned Docker API version"
    )]
    pub api_version: Option<String>,

    #[arg(
        short,
        long = "agent",
        global = true,
        help = "Agent service as service[:port], repeatable"
    )]
    pub agents: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show swarm nodes and their agents")]
    Nodes {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    #[command(about = "Show which endpoint a node's requests are routed to")]
    Agent {
        #[arg(help = "Node id, or '-' for the manager")]
        node: String,
    },
    #[command(about = "List networks, or resolve names for network ids")]
    Networks {
        #[arg(help = "Network ids to resolve")]
        ids: Vec<String>,
    },
    #[command(about = "Load the topology and print resolver metrics")]
    Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
