//! Dataflow job calls

use super::types::{
    Job, JobMetrics, JobView, ListJobMessagesResponse, MessageFilter, RequestedState,
};
use crate::gcp::client::GcpClient;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

pub struct DataflowClient<'a> {
    client: &'a GcpClient,
    project: String,
    /// Regional endpoint; the global job path is used without it
    region: Option<String>,
}

impl<'a> DataflowClient<'a> {
    pub fn new(client: &'a GcpClient, project: &str, region: Option<String>) -> Self {
        Self {
            client,
            project: project.to_string(),
            region: region.filter(|r| !r.is_empty()),
        }
    }

    fn job_url(&self, job_id: &str, suffix: &str) -> Result<String> {
        if job_id.is_empty() || job_id.contains('/') {
            bail!("Invalid job ID [{}]", job_id);
        }

        let path = match &self.region {
            Some(region) => format!("locations/{}/jobs/{}{}", region, job_id, suffix),
            None => format!("jobs/{}{}", job_id, suffix),
        };
        Ok(self.client.dataflow_url(&self.project, &path))
    }

    pub async fn get_job(&self, job_id: &str, view: JobView) -> Result<Job> {
        let url = with_query(
            &self.job_url(job_id, "")?,
            &[("view", Some(view.as_str().to_string()))],
        );
        let json = self.client.get(&url).await?;
        serde_json::from_value(json).context("Failed to parse Dataflow job")
    }

    pub async fn cancel(&self, job_id: &str) -> Result<Job> {
        self.request_state(job_id, RequestedState::Cancelled).await
    }

    pub async fn drain(&self, job_id: &str) -> Result<Job> {
        self.request_state(job_id, RequestedState::Drained).await
    }

    /// Ask the service to move the job to `state`
    pub async fn request_state(&self, job_id: &str, state: RequestedState) -> Result<Job> {
        tracing::info!("Requesting {} for job [{}]", state.as_str(), job_id);
        let body = serde_json::to_value(Job::requesting(state))?;
        let json = self.client.put(&self.job_url(job_id, "")?, &body).await?;
        serde_json::from_value(json).context("Failed to parse Dataflow job")
    }

    pub async fn list_messages(
        &self,
        job_id: &str,
        filter: &MessageFilter,
    ) -> Result<ListJobMessagesResponse> {
        if let (Some(after), Some(before)) = (filter.after, filter.before) {
            if after >= before {
                bail!("--after must be earlier than --before");
            }
        }

        let url = with_query(
            &self.job_url(job_id, "/messages")?,
            &[
                (
                    "minimumImportance",
                    filter.importance.map(|i| i.as_str().to_string()),
                ),
                ("startTime", filter.after.map(timestamp)),
                ("endTime", filter.before.map(timestamp)),
                ("pageSize", filter.page_size.map(|n| n.to_string())),
                ("pageToken", filter.page_token.clone()),
            ],
        );
        let json = self.client.get(&url).await?;
        serde_json::from_value(json).context("Failed to parse job messages")
    }

    pub async fn get_metrics(
        &self,
        job_id: &str,
        changed_after: Option<DateTime<Utc>>,
    ) -> Result<JobMetrics> {
        let url = with_query(
            &self.job_url(job_id, "/metrics")?,
            &[("startTime", changed_after.map(timestamp))],
        );
        let json = self.client.get(&url).await?;
        serde_json::from_value(json).context("Failed to parse job metrics")
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Append the present parameters as an encoded query string
fn with_query(url: &str, params: &[(&str, Option<String>)]) -> String {
    let query_parts: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();

    if query_parts.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, query_parts.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_query_encodes_and_skips_absent() {
        let url = with_query(
            "https://dataflow.googleapis.com/v1b3/projects/p/jobs/j/messages",
            &[
                ("startTime", Some("2024-05-01T10:00:00Z".to_string())),
                ("pageToken", None),
            ],
        );
        assert_eq!(
            url,
            "https://dataflow.googleapis.com/v1b3/projects/p/jobs/j/messages?startTime=2024-05-01T10%3A00%3A00Z"
        );
        assert_eq!(with_query("u", &[("a", None)]), "u");
    }

    #[test]
    fn test_timestamp_is_utc_rfc3339() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp(time), "2024-05-01T10:00:00Z");
    }
}
