use thiserror::Error;

/// Custom error types for vidgauge
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool invocation failed: {0}")]
    ToolInvocation(String),

    #[error("Malformed tool output: {0}")]
    MalformedOutput(String),

    #[error("No video stream found in {0}")]
    NoVideoStream(String),
}

/// Result type for vidgauge operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
