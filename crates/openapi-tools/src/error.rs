//! Error types for `apibridge-openapi-tools`.
//!
//! Only the ambient layers (spec loading, configuration, client construction) return these.
//! Compilation skips what it cannot use and tool invocation reports failures as result
//! envelopes, so neither produces an `OpenApiToolsError`.

use apibridge_http_tools::client::HttpToolsError;
use thiserror::Error;

/// Main error type for `OpenAPI` tooling.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// Configuration errors (invalid config, missing fields, conflicts).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime errors (unknown tool, malformed call arguments).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// HTTP client errors.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpToolsError),

    /// `OpenAPI` errors (base URL resolution, document shape).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    #[error("OpenAPI error: failed to fetch spec from '{url}': {message}")]
    OpenApiSpecFetch { url: String, message: String },

    #[error("OpenAPI error: failed to read spec file '{path}': {source}")]
    OpenApiSpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to parse OpenAPI spec from '{location}': {source}")]
    OpenApiSpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("OpenAPI error: spec from '{location}' is not a usable document: {source}")]
    OpenApiSpecShape {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("OpenAPI error: spec hash mismatch (expected {expected}, got {actual})")]
    SpecHashMismatch { expected: String, actual: String },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
