//! Dataflow v1b3 resources

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// Job carrying only a requested state, the body of cancel and drain
    pub fn requesting(state: RequestedState) -> Self {
        Self {
            requested_state: Some(state.as_str().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedState {
    Cancelled,
    Drained,
}

impl RequestedState {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestedState::Cancelled => "JOB_STATE_CANCELLED",
            RequestedState::Drained => "JOB_STATE_DRAINED",
        }
    }
}

/// Level of detail of `jobs describe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum JobView {
    #[default]
    Summary,
    All,
}

impl JobView {
    pub fn as_str(self) -> &'static str {
        match self {
            JobView::Summary => "JOB_VIEW_SUMMARY",
            JobView::All => "JOB_VIEW_ALL",
        }
    }
}

/// Minimum importance of listed job messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum Importance {
    Debug,
    Detailed,
    Basic,
    #[default]
    Warning,
    Error,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Debug => "JOB_MESSAGE_DEBUG",
            Importance::Detailed => "JOB_MESSAGE_DETAILED",
            Importance::Basic => "JOB_MESSAGE_BASIC",
            Importance::Warning => "JOB_MESSAGE_WARNING",
            Importance::Error => "JOB_MESSAGE_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_importance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobMessagesResponse {
    #[serde(default)]
    pub job_messages: Vec<JobMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_time: Option<String>,
    #[serde(default)]
    pub metrics: Vec<Value>,
}

/// Filters of `messages list`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFilter {
    pub importance: Option<Importance>,
    /// Only messages at or after this time
    pub after: Option<DateTime<Utc>>,
    /// Only messages before this time
    pub before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}
