//! Dataproc v1 resources

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const MAX_LABEL_LENGTH: usize = 63;
const MAX_JOB_ID_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// State of a cluster or a job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPlacement {
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,
}

/// Restart policy of a job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobScheduling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failures_per_hour: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_jar_file_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jar_file_uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PySparkJob {
    pub main_python_file_uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub python_file_uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jar_file_uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Driver configuration; a job carries exactly one
#[derive(Debug, Clone, PartialEq)]
pub enum JobDriver {
    Spark(SparkJob),
    PySpark(PySparkJob),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<JobReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<JobPlacement>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<JobScheduling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_job: Option<SparkJob>,
    #[serde(
        rename = "pysparkJob",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pyspark_job: Option<PySparkJob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_output_resource_uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// New job placed on `cluster` running `driver`
    pub fn new(reference: JobReference, cluster: &str, driver: JobDriver) -> Self {
        let mut job = Self {
            reference: Some(reference),
            placement: Some(JobPlacement {
                cluster_name: cluster.to_string(),
                cluster_uuid: None,
            }),
            ..Default::default()
        };
        match driver {
            JobDriver::Spark(spark) => job.spark_job = Some(spark),
            JobDriver::PySpark(pyspark) => job.pyspark_job = Some(pyspark),
        }
        job
    }

    pub fn job_id(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.job_id.as_str())
    }
}

/// Body of `jobs:submit`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    pub job: Job,
    /// Lets the server drop a duplicate submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Fresh job id, a UUID without hyphens
pub fn generate_job_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Job ids hold letters, digits, underscores and hyphens
pub fn validate_job_id(id: &str) -> Result<(), String> {
    if id.is_empty() || id.len() > MAX_JOB_ID_LENGTH {
        return Err(format!(
            "must be between 1 and {} characters",
            MAX_JOB_ID_LENGTH
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!(
            "{} may only contain letters, digits, underscores and hyphens",
            id
        ));
    }
    Ok(())
}

fn label_chars_valid(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Parse one `KEY=VALUE` label
pub fn parse_label(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))?;

    let key_valid = key.len() <= MAX_LABEL_LENGTH
        && key.starts_with(|c: char| c.is_ascii_lowercase())
        && label_chars_valid(key);
    if !key_valid {
        return Err(format!(
            "label key '{}' must start with a lowercase letter and contain only \
             lowercase letters, digits, underscores and hyphens (at most {})",
            key, MAX_LABEL_LENGTH
        ));
    }
    if val.len() > MAX_LABEL_LENGTH || !label_chars_valid(val) {
        return Err(format!(
            "label value '{}' may contain only lowercase letters, digits, \
             underscores and hyphens (at most {})",
            val, MAX_LABEL_LENGTH
        ));
    }
    Ok((key.to_string(), val.to_string()))
}

/// Parse one `KEY=VALUE` job property
pub fn parse_property(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.is_empty() => Ok((key.to_string(), val.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}
