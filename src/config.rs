//! Resolver configuration
//!
//! Options come from defaults, the environment, an optional YAML file and
//! finally command-line flags, each layer overriding the previous one.

use crate::docker::engine::parse_api_version;
use crate::{Result, SwirlError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_API_VERSION: &str = "1.41";
pub const DEFAULT_AGENT_SERVICE: &str = "swirl-agent";
pub const DEFAULT_AGENT_PORT: u16 = 2375;

pub const ENV_DOCKER_ENDPOINT: &str = "SWIRL_DOCKER_ENDPOINT";
pub const ENV_DOCKER_API_VERSION: &str = "SWIRL_DOCKER_API_VERSION";
pub const ENV_AGENTS: &str = "SWIRL_AGENTS";

/// Agent service specification in `service[:port]` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentSpec {
    pub service: String,
    pub port: u16,
}

impl AgentSpec {
    pub fn new(service: impl Into<String>, port: u16) -> Self {
        Self {
            service: service.into(),
            port,
        }
    }

    pub fn parse(spec: &str) -> Result<Self> {
        let (service, port) = match spec.split_once(':') {
            Some((service, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    SwirlError::ConfigError(format!("invalid agent port in '{}': {}", spec, e))
                })?;
                (service, port)
            }
            None => (spec, DEFAULT_AGENT_PORT),
        };

        let service = service.trim();
        if service.is_empty() {
            return Err(SwirlError::ConfigError(format!(
                "agent spec '{}' has no service name",
                spec
            )));
        }

        Ok(Self::new(service, port))
    }
}

impl fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.port)
    }
}

impl TryFrom<String> for AgentSpec {
    type Error = SwirlError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AgentSpec> for String {
    fn from(spec: AgentSpec) -> Self {
        spec.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Manager endpoint; `None` resolves from `DOCKER_HOST`.
    pub docker_endpoint: Option<String>,
    pub docker_api_version: String,
    pub agents: Vec<AgentSpec>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            docker_endpoint: None,
            docker_api_version: DEFAULT_API_VERSION.to_string(),
            agents: vec![AgentSpec::new(DEFAULT_AGENT_SERVICE, DEFAULT_AGENT_PORT)],
        }
    }
}

impl Options {
    /// Defaults overridden by `SWIRL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Load options from a YAML file, then apply the environment on top
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let options: Options = serde_yaml::from_str(&content).map_err(|e| {
            SwirlError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })?;
        options.merge_env(|key| std::env::var(key).ok())
    }

    fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_DOCKER_ENDPOINT).filter(|v| !v.is_empty()) {
            self.docker_endpoint = Some(endpoint);
        }
        if let Some(version) = lookup(ENV_DOCKER_API_VERSION).filter(|v| !v.is_empty()) {
            self.docker_api_version = version;
        }
        if let Some(agents) = lookup(ENV_AGENTS) {
            self.agents = parse_agent_list(&agents)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        parse_api_version(&self.docker_api_version)?;

        if matches!(&self.docker_endpoint, Some(e) if e.trim().is_empty()) {
            return Err(SwirlError::ConfigError(
                "Docker endpoint must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a comma-separated list of agent specs, skipping blank entries
pub fn parse_agent_list(list: &str) -> Result<Vec<AgentSpec>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AgentSpec::parse)
        .collect()
}
