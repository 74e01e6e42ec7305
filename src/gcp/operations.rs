//! Compute Engine long-running operations
//!
//! Mutating Compute calls return an Operation resource. These helpers poll it
//! until it is DONE and turn an operation-level error into a failure.

use super::client::GcpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

/// Status of a Compute Engine operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Done,
    Failed(String),
    Running,
    Unknown(String),
}

/// Read the status of an operation resource
pub fn operation_status(operation: &Value) -> OperationStatus {
    let status = operation
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    match status {
        "DONE" => match operation_errors(operation) {
            Some(errors) => OperationStatus::Failed(errors),
            None => OperationStatus::Done,
        },
        "PENDING" | "RUNNING" => OperationStatus::Running,
        other => OperationStatus::Unknown(other.to_string()),
    }
}

/// Join the messages of `error.errors[]`, if the operation carries any
fn operation_errors(operation: &Value) -> Option<String> {
    let errors = operation
        .get("error")
        .and_then(|e| e.get("errors"))
        .and_then(|e| e.as_array())?;

    if errors.is_empty() {
        return None;
    }

    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            let code = e.get("code").and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
            let message = e.get("message").and_then(|v| v.as_str()).unwrap_or("-");
            format!("{}: {}", code, message)
        })
        .collect();

    Some(messages.join("; "))
}

/// Path of an operation relative to the project (`zones/z/operations/name`)
fn operation_path(operation: &Value) -> Result<String> {
    let name = operation
        .get("name")
        .and_then(|v| v.as_str())
        .context("Operation has no name")?;

    let short = |key: &str| {
        operation
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.rsplit('/').next().unwrap_or(s).to_string())
    };

    Ok(if let Some(zone) = short("zone") {
        format!("zones/{}/operations/{}", zone, name)
    } else if let Some(region) = short("region") {
        format!("regions/{}/operations/{}", region, name)
    } else {
        format!("global/operations/{}", name)
    })
}

/// How often and how long to poll an operation
#[derive(Debug, Clone, Copy)]
pub struct OperationPoller {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

impl OperationPoller {
    /// Wait until `operation` is DONE
    pub async fn wait(&self, client: &GcpClient, version: &str, operation: &Value) -> Result<()> {
        let path = operation_path(operation)?;
        let url = client.compute_url(version, &path);

        let mut current = operation.clone();
        let poll = async {
            loop {
                match operation_status(&current) {
                    OperationStatus::Done => return Ok::<(), anyhow::Error>(()),
                    OperationStatus::Failed(error) => {
                        return Err(anyhow::anyhow!("Operation [{}] failed: {}", path, error));
                    }
                    OperationStatus::Running => {}
                    OperationStatus::Unknown(s) => {
                        tracing::warn!("Unknown operation status: {}", s);
                    }
                }

                tokio::time::sleep(self.interval).await;
                current = client
                    .get(&url)
                    .await
                    .with_context(|| format!("Failed to poll operation [{}]", path))?;
            }
        };

        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Timed out after {:?} waiting for operation [{}]",
                    self.timeout,
                    path
                )
            })?
    }
}
