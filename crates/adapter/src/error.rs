//! Error types for the apibridge CLI.

use apibridge_openapi_tools::OpenApiToolsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Configuration errors (missing spec, unreadable config file, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spec loading, compilation setup and tool lookup errors
    #[error(transparent)]
    OpenApi(#[from] OpenApiToolsError),

    /// `--args` is not valid JSON
    #[error("Invalid --args JSON: {0}")]
    Arguments(#[source] serde_json::Error),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
