//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use crate::resource::ResourceReference;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root URLs of the APIs gcpctl talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub compute: String,
    pub iam: String,
    pub dataflow: String,
    pub dataproc: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com".to_string(),
            iam: "https://iam.googleapis.com".to_string(),
            dataflow: "https://dataflow.googleapis.com".to_string(),
            dataproc: "https://dataproc.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every API at the same root (used against local mock servers)
    pub fn all(root: &str) -> Self {
        Self {
            compute: root.to_string(),
            iam: root.to_string(),
            dataflow: root.to_string(),
            dataproc: root.to_string(),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    pub endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client using ambient credentials
    pub async fn new(project_id: &str, endpoints: Endpoints) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, project_id, endpoints)
    }

    /// Create a client with explicit credentials
    pub fn with_credentials(
        credentials: GcpCredentials,
        project_id: &str,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            project_id: project_id.to_string(),
            endpoints,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, body: &Value) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.put(url, &token, body).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Compute Engine API root for an API version (`v1`, `beta`, `alpha`)
    pub fn compute_base(&self, version: &str) -> String {
        format!(
            "{}/compute/{}",
            self.endpoints.compute.trim_end_matches('/'),
            version
        )
    }

    /// Build Compute Engine API URL under the client's project
    pub fn compute_url(&self, version: &str, path: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.compute_base(version),
            self.project_id,
            path
        )
    }

    /// Build the Compute Engine URL of a resolved reference
    pub fn compute_link(&self, version: &str, reference: &ResourceReference) -> String {
        reference.self_link(&self.compute_base(version))
    }

    // =========================================================================
    // IAM API helpers
    // =========================================================================

    /// Build IAM API URL
    pub fn iam_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.endpoints.iam.trim_end_matches('/'), path)
    }

    // =========================================================================
    // Dataflow API helpers
    // =========================================================================

    /// Build Dataflow API URL under a project
    pub fn dataflow_url(&self, project: &str, path: &str) -> String {
        format!(
            "{}/v1b3/projects/{}/{}",
            self.endpoints.dataflow.trim_end_matches('/'),
            project,
            path
        )
    }

    // =========================================================================
    // Dataproc API helpers
    // =========================================================================

    /// Build Dataproc API URL under a project region
    pub fn dataproc_url(&self, project: &str, region: &str, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/regions/{}/{}",
            self.endpoints.dataproc.trim_end_matches('/'),
            project,
            region,
            path
        )
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}
