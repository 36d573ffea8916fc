// Public modules
pub mod api;
pub mod environment;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod redaction;
pub mod source;
pub mod upload;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use upload::{Classification, RetryPolicy, UploadOutcome, UploadRequest};
