use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SourceNotFound,
    SourceAmbiguous,
    SourceEmpty,

    PipelineParseFailed,

    RedactionSecretDetected,

    UploadMissingJobId,
    UploadMissingAccessToken,
    UploadRejected,
    UploadAttemptsExhausted,

    GitCommandFailed,

    ValidationInvalidArgument,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SourceNotFound => "source.not_found",
            ErrorCode::SourceAmbiguous => "source.ambiguous",
            ErrorCode::SourceEmpty => "source.empty",

            ErrorCode::PipelineParseFailed => "pipeline.parse_failed",

            ErrorCode::RedactionSecretDetected => "redaction.secret_detected",

            ErrorCode::UploadMissingJobId => "upload.missing_job_id",
            ErrorCode::UploadMissingAccessToken => "upload.missing_access_token",
            ErrorCode::UploadRejected => "upload.rejected",
            ErrorCode::UploadAttemptsExhausted => "upload.attempts_exhausted",

            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Process exit code for a fatal error of this kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::ValidationInvalidArgument
            | ErrorCode::UploadMissingJobId
            | ErrorCode::UploadMissingAccessToken => 2,

            ErrorCode::SourceNotFound
            | ErrorCode::SourceAmbiguous
            | ErrorCode::SourceEmpty => 3,

            ErrorCode::PipelineParseFailed | ErrorCode::RedactionSecretDetected => 5,

            ErrorCode::UploadRejected
            | ErrorCode::UploadAttemptsExhausted
            | ErrorCode::GitCommandFailed => 20,

            ErrorCode::InternalIoError
            | ErrorCode::InternalJsonError
            | ErrorCode::InternalUnexpected => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceNotFoundDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub searched: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAmbiguousDetails {
    pub found: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginDetails {
    pub origin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailedDetails {
    pub origin: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRejectedDetails {
    pub status: u16,
    pub attempt: u32,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptsExhaustedDetails {
    pub max_attempts: u32,
    pub last_error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn source_not_found(path: Option<String>, searched: Vec<String>) -> Self {
        let message = match &path {
            Some(p) => format!("Failed to read pipeline config from \"{}\"", p),
            None => "Could not find a default pipeline configuration file".to_string(),
        };
        Self::new(
            ErrorCode::SourceNotFound,
            message,
            to_details(SourceNotFoundDetails { path, searched }),
        )
        .with_hint("Run 'pipeup upload --help' to see the default search locations")
    }

    pub fn source_ambiguous(found: Vec<String>) -> Self {
        let message = format!(
            "Found multiple configuration files: {}. Please only have 1 configuration file present",
            found.join(", ")
        );
        Self::new(
            ErrorCode::SourceAmbiguous,
            message,
            to_details(SourceAmbiguousDetails { found }),
        )
    }

    pub fn source_empty(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self::new(
            ErrorCode::SourceEmpty,
            format!("Pipeline config \"{}\" is empty", origin),
            to_details(OriginDetails { origin }),
        )
    }

    pub fn pipeline_parse_failed(origin: impl Into<String>, error: impl Into<String>) -> Self {
        let origin = origin.into();
        let error = error.into();
        Self::new(
            ErrorCode::PipelineParseFailed,
            format!("Pipeline parsing of \"{}\" failed ({})", origin, error),
            to_details(ParseFailedDetails { origin, error }),
        )
    }

    pub fn redaction_secret_detected(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self::new(
            ErrorCode::RedactionSecretDetected,
            format!(
                "Refusing to upload pipeline \"{}\" containing redacted vars",
                origin
            ),
            to_details(OriginDetails { origin }),
        )
        .with_hint("Ensure your pipeline does not include secret values or interpolated secret values")
    }

    pub fn upload_missing_job_id() -> Self {
        Self::new(
            ErrorCode::UploadMissingJobId,
            "Missing job parameter",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("Usually this is set in the job environment via BUILDKITE_JOB_ID")
    }

    pub fn upload_missing_access_token() -> Self {
        Self::new(
            ErrorCode::UploadMissingAccessToken,
            "Missing agent-access-token parameter",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("Usually this is set in the job environment via BUILDKITE_AGENT_ACCESS_TOKEN")
    }

    pub fn upload_rejected(status: u16, attempt: u32, error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::UploadRejected,
            format!("Failed to upload and process pipeline: {}", error),
            to_details(UploadRejectedDetails {
                status,
                attempt,
                error,
            }),
        )
        .retryable(false)
    }

    pub fn upload_attempts_exhausted(max_attempts: u32, last_error: impl Into<String>) -> Self {
        let last_error = last_error.into();
        Self::new(
            ErrorCode::UploadAttemptsExhausted,
            format!("Failed to upload and process pipeline: {}", last_error),
            to_details(AttemptsExhaustedDetails {
                max_attempts,
                last_error,
            }),
        )
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
        };
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", details.problem),
            to_details(details),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}
