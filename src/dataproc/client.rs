//! Dataproc cluster and job calls

use super::types::{Cluster, Job, SubmitJobRequest};
use crate::gcp::client::GcpClient;
use anyhow::{bail, Context, Result};

pub struct DataprocClient<'a> {
    client: &'a GcpClient,
    project: String,
    region: String,
}

impl<'a> DataprocClient<'a> {
    pub fn new(client: &'a GcpClient, project: &str, region: &str) -> Self {
        Self {
            client,
            project: project.to_string(),
            region: region.to_string(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn url(&self, path: &str) -> String {
        self.client.dataproc_url(&self.project, &self.region, path)
    }

    pub async fn get_cluster(&self, name: &str) -> Result<Cluster> {
        if name.is_empty() || name.contains('/') {
            bail!("Invalid cluster name [{}]", name);
        }

        let json = self.client.get(&self.url(&format!("clusters/{}", name))).await?;
        serde_json::from_value(json).context("Failed to parse Dataproc cluster")
    }

    /// Submit `job`; the returned job is as the service accepted it
    pub async fn submit_job(&self, job: Job) -> Result<Job> {
        tracing::info!(
            "Submitting job [{}] in region {}",
            job.job_id().unwrap_or("-"),
            self.region
        );

        let request = SubmitJobRequest {
            job,
            request_id: Some(uuid::Uuid::new_v4().to_string()),
        };
        let body = serde_json::to_value(&request)?;
        let json = self.client.post(&self.url("jobs:submit"), Some(&body)).await?;
        serde_json::from_value(json).context("Failed to parse Dataproc job")
    }
}
