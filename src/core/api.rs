//! HTTP client for the build-orchestration service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::log_info;
use crate::upload::{PipelineApi, UploadRequest};

pub const DEFAULT_ENDPOINT: &str = "https://agent.buildkite.com/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error from one submission attempt.
///
/// Carries the HTTP status when the server produced one; transport
/// failures (connect errors, timeouts) have no status.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub endpoint: String,
    pub access_token: String,
    pub no_http2: bool,
    pub debug_http: bool,
}

/// Request body for the "submit pipeline change" operation.
#[derive(Serialize)]
struct PipelineChange<'a> {
    uuid: &'a Uuid,
    pipeline: &'a Value,
    replace: bool,
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    access_token: String,
    debug_http: bool,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::validation_invalid_argument(
                "endpoint",
                "Agent API endpoint is not configured",
            ));
        }

        let mut builder = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pipeup/", env!("CARGO_PKG_VERSION")));

        if config.no_http2 {
            builder = builder.http1_only();
        }

        let client = builder
            .build()
            .map_err(|e| Error::internal_unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            debug_http: config.debug_http,
        })
    }
}

impl PipelineApi for ApiClient {
    fn upload_pipeline(&self, request: &UploadRequest) -> std::result::Result<(), ApiError> {
        let url = format!("{}/jobs/{}/pipelines", self.endpoint, request.job_id);

        if self.debug_http {
            log_info!("POST {} (uuid {})", url, request.change_id);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.access_token))
            .json(&PipelineChange {
                uuid: &request.change_id,
                pipeline: &request.document,
                replace: request.replace,
            })
            .send()
            .map_err(|e| ApiError {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            if self.debug_http {
                log_info!("{} {}", status.as_u16(), url);
            }
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        let message = match extract_error_message(&body) {
            Some(message) => message,
            None if body.trim().is_empty() => status.to_string(),
            None => body.trim().to_string(),
        };

        Err(ApiError {
            status: Some(status.as_u16()),
            message,
        })
    }
}

/// Pull the `message` field out of a structured error body, if any.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn empty_endpoint_is_rejected_at_construction() {
        let err = ApiClient::new(&ApiConfig {
            endpoint: String::new(),
            access_token: "token-1".to_string(),
            no_http2: false,
            debug_http: false,
        })
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationInvalidArgument);
    }

    #[test]
    fn structured_error_body_yields_its_message() {
        let body = r#"{"message": "Invalid pipeline step"}"#;
        assert_eq!(
            extract_error_message(body),
            Some("Invalid pipeline step".to_string())
        );
    }

    #[test]
    fn unstructured_body_yields_nothing() {
        assert_eq!(extract_error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = ApiError {
            status: Some(422),
            message: "Invalid pipeline step".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 422: Invalid pipeline step");
    }
}
