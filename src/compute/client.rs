//! Backend service Get/Update over the Compute Engine REST API

use super::channel::ChannelCapabilities;
use super::types::BackendService;
use crate::gcp::client::GcpClient;
use crate::gcp::operations::OperationPoller;
use crate::resource::{ResourceClient, ResourceReference};
use anyhow::{Context, Result};
use async_trait::async_trait;

pub struct BackendServiceClient<'a> {
    client: &'a GcpClient,
    caps: &'static ChannelCapabilities,
    poller: OperationPoller,
}

impl<'a> BackendServiceClient<'a> {
    pub fn new(client: &'a GcpClient, caps: &'static ChannelCapabilities) -> Self {
        Self {
            client,
            caps,
            poller: OperationPoller::default(),
        }
    }

    pub fn with_poller(mut self, poller: OperationPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Compute API root for the selected channel
    pub fn api_base(&self) -> String {
        self.client.compute_base(self.caps.api_version)
    }

    pub fn link(&self, reference: &ResourceReference) -> String {
        self.client.compute_link(self.caps.api_version, reference)
    }
}

#[async_trait]
impl ResourceClient for BackendServiceClient<'_> {
    type Resource = BackendService;

    async fn get(&self, reference: &ResourceReference) -> Result<BackendService> {
        let json = self.client.get(&self.link(reference)).await?;
        serde_json::from_value(json)
            .with_context(|| format!("Failed to parse backend service [{}]", reference.name()))
    }

    async fn update(
        &self,
        reference: &ResourceReference,
        resource: &BackendService,
    ) -> Result<BackendService> {
        // requestId lets the server drop a duplicate of this write
        let url = format!(
            "{}?requestId={}",
            self.link(reference),
            uuid::Uuid::new_v4()
        );
        let body = serde_json::to_value(resource)?;

        tracing::debug!("Updating backend service [{}]", reference.name());
        let operation = self.client.put(&url, &body).await?;
        self.poller
            .wait(self.client, self.caps.api_version, &operation)
            .await?;

        self.get(reference).await
    }
}
