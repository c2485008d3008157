use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwirlError {
    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),

    #[error("Docker backend error: {0}")]
    Backend(String),

    #[error("failed to load agents: {0}")]
    LoadAgents(#[source] Box<SwirlError>),

    #[error("Timed out after {elapsed:?} while {operation}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("Agent client for node {node} at {address} is unavailable: {source}")]
    AgentUnavailable {
        node: String,
        address: String,
        #[source]
        source: Arc<SwirlError>,
    },

    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One failure handed to every waiter of a shared computation.
    #[error(transparent)]
    Shared(Arc<SwirlError>),
}

impl SwirlError {
    /// Whether the backend reported that the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            SwirlError::DockerApi(bollard::errors::Error::DockerResponseServerError {
                status_code,
                ..
            }) => *status_code == 404,
            SwirlError::NetworkNotFound(_) => true,
            SwirlError::LoadAgents(inner) => inner.is_not_found(),
            SwirlError::AgentUnavailable { source, .. } => source.is_not_found(),
            SwirlError::Shared(inner) => inner.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SwirlError>;
