//! HTTP semantics helpers.
//!
//! Tool annotations for HTTP-backed tools follow RFC 9110 method semantics.

use crate::method::HttpMethod;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations based on HTTP method semantics.
///
/// `openWorldHint` is always `true`: every compiled tool talks to an external system.
#[must_use]
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get | HttpMethod::Head | HttpMethod::Options => (true, false, Some(true)),
        HttpMethod::Post => (false, false, Some(false)),
        HttpMethod::Put | HttpMethod::Delete => (false, true, Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpMethod::Patch => (false, true, None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(destructive),
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}
