//! Service account IAM policy RPCs

use super::policy::Policy;
use crate::error::UpdateError;
use crate::gcp::client::GcpClient;
use crate::resource::{ReferenceResolver, ResourceClient, ResourceReference};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

/// Reference of a service account given by its email address or its
/// `projects/p/serviceAccounts/email` path
pub fn service_account_reference(address: &str) -> Result<ResourceReference, UpdateError> {
    let invalid = |reason: String| UpdateError::invalid_value("IAM-ADDRESS", reason);

    // `-` lets the API infer the project from the account
    let reference = ReferenceResolver::new("-")
        .resolve_project("serviceAccounts", address)
        .map_err(|e| invalid(e.to_string()))?;

    let valid = reference
        .name()
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        return Err(invalid(format!(
            "{} is not a service account email address",
            reference.name()
        )));
    }
    Ok(reference)
}

/// Reads and writes the IAM policy of service accounts
pub struct ServiceAccountPolicyClient<'a> {
    client: &'a GcpClient,
}

impl<'a> ServiceAccountPolicyClient<'a> {
    pub fn new(client: &'a GcpClient) -> Self {
        Self { client }
    }

    fn method_url(&self, reference: &ResourceReference, method: &str) -> String {
        self.client
            .iam_url(&format!("{}:{}", reference.relative_name(), method))
    }
}

#[async_trait]
impl ResourceClient for ServiceAccountPolicyClient<'_> {
    type Resource = Policy;

    async fn get(&self, reference: &ResourceReference) -> Result<Policy> {
        let json = self
            .client
            .post(&self.method_url(reference, "getIamPolicy"), None)
            .await?;
        serde_json::from_value(json).context("Failed to parse IAM policy")
    }

    async fn update(&self, reference: &ResourceReference, resource: &Policy) -> Result<Policy> {
        let body = json!({ "policy": resource });
        let json = self
            .client
            .post(&self.method_url(reference, "setIamPolicy"), Some(&body))
            .await?;
        serde_json::from_value(json).context("Failed to parse IAM policy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_reference() {
        let reference =
            service_account_reference("deployer@my-project.iam.gserviceaccount.com").unwrap();
        assert_eq!(
            reference.relative_name(),
            "projects/-/serviceAccounts/deployer@my-project.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_service_account_path_is_accepted() {
        let reference = service_account_reference(
            "projects/my-project/serviceAccounts/deployer@my-project.iam.gserviceaccount.com",
        )
        .unwrap();
        assert_eq!(reference.project(), "my-project");
        assert_eq!(reference.name(), "deployer@my-project.iam.gserviceaccount.com");

        assert!(service_account_reference("projects/p/global/serviceAccounts/a@b.com").is_err());
        assert!(service_account_reference("projects/p/keys/a@b.com").is_err());
    }

    #[test]
    fn test_rejects_non_email() {
        assert!(service_account_reference("deployer").is_err());
        assert!(service_account_reference("@example.com").is_err());
        assert!(service_account_reference("deployer@localhost").is_err());
    }
}
