//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Maximum length of a server error message surfaced to the user
const MAX_MESSAGE_LENGTH: usize = 300;

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = floor_char_boundary(body, MAX_LOG_BODY_LENGTH);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A non-success HTTP status returned by a GCP API.
///
/// Carried inside the `anyhow::Error` chain so callers can branch on the
/// status code (see [`api_status`]).
#[derive(Debug, Error)]
#[error("API request failed: {status}{}", detail(.message))]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub message: Option<String>,
}

fn detail(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" - {}", m))
        .unwrap_or_default()
}

impl ApiStatusError {
    /// Build from a status and the raw error body (`{"error": {"message": ...}}`)
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .map(|m| {
                let cut = floor_char_boundary(&m, MAX_MESSAGE_LENGTH);
                m[..cut].to_string()
            });

        Self { status, message }
    }
}

/// Find the HTTP status of a failed API call anywhere in an error chain
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiStatusError>())
        .map(|e| e.status)
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("gcpctl/{}", crate::VERSION))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url).bearer_auth(token)).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("PUT {}", url);
        self.execute(self.client.put(url).bearer_auth(token).json(body))
            .await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log sanitized/truncated error body
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiStatusError::from_body(status, &body).into());
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    if let Some(api) = error.chain().find_map(|e| e.downcast_ref::<ApiStatusError>()) {
        let hint = match api.status {
            StatusCode::FORBIDDEN => "Permission denied. Check your GCP IAM permissions.",
            StatusCode::UNAUTHORIZED => {
                "Authentication failed. Run 'gcloud auth application-default login'."
            }
            StatusCode::NOT_FOUND => "Resource not found.",
            StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded. Please try again later.",
            StatusCode::BAD_REQUEST => "Invalid request. Check your parameters.",
            StatusCode::CONFLICT => {
                "Resource conflict. The resource was modified concurrently or is in use."
            }
            StatusCode::PRECONDITION_FAILED => {
                "Resource changed since it was read. Please retry."
            }
            s if s.is_server_error() => "GCP service temporarily unavailable. Please try again.",
            _ => "Request failed.",
        };

        return match &api.message {
            Some(message) => format!("{} {}", hint, sanitize_for_log(message)),
            None => hint.to_string(),
        };
    }

    format!("{:#}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_message_is_extracted() {
        let body = r#"{"error": {"code": 412, "message": "Invalid fingerprint"}}"#;
        let err = ApiStatusError::from_body(StatusCode::PRECONDITION_FAILED, body);
        assert_eq!(err.message.as_deref(), Some("Invalid fingerprint"));
        assert_eq!(
            err.to_string(),
            "API request failed: 412 Precondition Failed - Invalid fingerprint"
        );
    }

    #[test]
    fn test_non_json_error_body() {
        let err = ApiStatusError::from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(err.message.is_none());
    }

    #[test]
    fn test_api_status_found_through_context() {
        let err: anyhow::Error = ApiStatusError {
            status: StatusCode::CONFLICT,
            message: None,
        }
        .into();
        let err = err.context("Failed to set IAM policy");
        assert_eq!(api_status(&err), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn test_format_gcp_error_uses_status_hint() {
        let err: anyhow::Error = ApiStatusError {
            status: StatusCode::FORBIDDEN,
            message: Some("Required 'compute.backendServices.update'".to_string()),
        }
        .into();
        let msg = format_gcp_error(&err);
        assert!(msg.starts_with("Permission denied."));
        assert!(msg.contains("compute.backendServices.update"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }
}
