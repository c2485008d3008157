use crate::docker::api::{ClientHandle, Connector, Endpoint};
use crate::{Result, SwirlError};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Lazily builds the one client bound to the swarm manager.
///
/// The handle is published once and read without locking afterwards. A failed
/// construction leaves the cell empty so the next caller retries.
pub struct ClientFactory {
    connector: Arc<dyn Connector>,
    endpoint: Endpoint,
    api_version: String,
    client: OnceCell<ClientHandle>,
}

impl ClientFactory {
    pub fn new(
        connector: Arc<dyn Connector>,
        endpoint: Endpoint,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            endpoint,
            api_version: api_version.into(),
            client: OnceCell::new(),
        }
    }

    pub async fn primary(&self) -> Result<ClientHandle> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }

        let client = self
            .client
            .get_or_try_init(|| async {
                debug!(endpoint = %self.endpoint, "Initializing Docker manager client");

                let client = self
                    .connector
                    .connect(&self.endpoint, &self.api_version)
                    .map_err(|e| {
                        warn!(endpoint = %self.endpoint, error = %e, "Failed to create Docker manager client");
                        e
                    })?;

                info!(
                    endpoint = %self.endpoint,
                    api_version = %self.api_version,
                    "Docker manager client ready"
                );
                Ok::<_, SwirlError>(client)
            })
            .await?;

        Ok(client.clone())
    }

    /// Build a client for another endpoint with the same pinned API version
    pub fn connect(&self, endpoint: &Endpoint) -> Result<ClientHandle> {
        self.connector.connect(endpoint, &self.api_version)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}
