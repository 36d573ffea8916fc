//! Upload workflow and retry state machine.
//!
//! Parse → (dry-run exit) → redaction guard → bounded, fixed-interval
//! submission loop. The change id is generated once per invocation and
//! reused unchanged across every retry so the service can deduplicate
//! resubmissions of the same logical change.

use std::io::Write;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::api::ApiError;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::pipeline::{self, PipelineParser};
use crate::redaction;
use crate::source::PipelineSource;
use crate::{log_error, log_info, log_warn};

/// One logical "submit pipeline change" operation.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub job_id: String,
    pub change_id: Uuid,
    pub document: Value,
    pub replace: bool,
}

/// Delivery seam for the remote service, so tests can record attempts
/// without a network.
pub trait PipelineApi {
    fn upload_pipeline(&self, request: &UploadRequest) -> std::result::Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    // Server errors mean downtime or other transient problems: retry every
    // 5 seconds, 60 times, for a total of 5 minutes.
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Retryable,
    Permanent,
}

/// Classify a failed attempt. HTTP 422 is a semantic rejection the service
/// will repeat verbatim, so retrying it is pointless; everything else
/// (transport failures, other statuses, timeouts) may clear up.
pub fn classify(err: &ApiError) -> Classification {
    if err.status == Some(422) {
        Classification::Permanent
    } else {
        Classification::Retryable
    }
}

/// Stateless retry decision for a failed attempt.
pub fn should_retry(policy: &RetryPolicy, attempt: u32, classification: Classification) -> bool {
    classification == Classification::Retryable && attempt < policy.max_attempts
}

/// Deliver `request`, retrying transient failures up to the policy budget.
///
/// Returns the number of attempts performed on success.
pub fn submit(
    api: &dyn PipelineApi,
    policy: &RetryPolicy,
    request: &UploadRequest,
) -> Result<u32> {
    let mut last_error: Option<ApiError> = None;

    for attempt in 1..=policy.max_attempts {
        let err = match api.upload_pipeline(request) {
            Ok(()) => return Ok(attempt),
            Err(err) => err,
        };

        log_warn!(
            "{} (attempt {}/{}, retrying every {:?})",
            err,
            attempt,
            policy.max_attempts,
            policy.interval
        );

        if classify(&err) == Classification::Permanent {
            log_error!("Unrecoverable error, skipping retries");
            return Err(Error::upload_rejected(
                err.status.unwrap_or(422),
                attempt,
                err.to_string(),
            ));
        }

        if should_retry(policy, attempt, Classification::Retryable) {
            thread::sleep(policy.interval);
        }
        last_error = Some(err);
    }

    Err(Error::upload_attempts_exhausted(
        policy.max_attempts,
        last_error.map(|e| e.to_string()).unwrap_or_default(),
    ))
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub job_id: String,
    pub access_token: String,
    pub replace: bool,
    pub dry_run: bool,
    pub no_interpolation: bool,
    pub redacted_vars: Vec<String>,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Document written to `out`; no guard, no credentials, no network.
    DryRun,
    Uploaded { change_id: Uuid, attempts: u32 },
}

/// Run the workflow from a resolved source to a terminal outcome.
///
/// In dry-run mode the parsed document is written to `out` as indented
/// JSON and the workflow ends successfully with no further step.
pub fn run(
    cfg: &UploadConfig,
    source: &PipelineSource,
    env: &Environment,
    api: &dyn PipelineApi,
    out: &mut dyn Write,
) -> Result<UploadOutcome> {
    let parser = PipelineParser {
        env,
        filename: source.origin_name.clone(),
        no_interpolation: cfg.no_interpolation,
    };
    let document = parser.parse(&source.content)?;

    if cfg.dry_run {
        pipeline::write_document_pretty(&document, out)?;
        return Ok(UploadOutcome::DryRun);
    }

    redaction::check(&document, &cfg.redacted_vars, env, &source.origin_name)?;

    if cfg.job_id.is_empty() {
        return Err(Error::upload_missing_job_id());
    }
    if cfg.access_token.is_empty() {
        return Err(Error::upload_missing_access_token());
    }

    // Generated once, outside the retry loop.
    let change_id = Uuid::new_v4();
    let request = UploadRequest {
        job_id: cfg.job_id.clone(),
        change_id,
        document,
        replace: cfg.replace,
    };

    let attempts = submit(api, &cfg.retry, &request)?;
    log_info!("Successfully uploaded and parsed pipeline config");

    Ok(UploadOutcome::Uploaded {
        change_id,
        attempts,
    })
}
