//! Per-tool request execution.
//!
//! A [`ToolInvoker`] owns everything needed to turn an argument object into one HTTP request and
//! the response (or failure) into a single-block [`CallToolResult`]. Nothing escapes
//! [`ToolInvoker::invoke`] as an error: failures become `isError: true` envelopes.

use crate::document::{BodySchema, ConcreteParameter, ParamLocation};
use crate::normalize::{Payload, normalize_response};
use apibridge_http_tools::client::{ApiClient, ApiRequest, HttpToolsError};
use apibridge_http_tools::method::HttpMethod;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::{Map, Value};

/// Marker every failure text starts with.
pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Debug, Clone)]
pub struct ToolInvoker {
    tool_name: String,
    client: ApiClient,
    method: HttpMethod,
    template: String,
    path_params: Vec<String>,
    query_params: Vec<String>,
    /// Empty when the operation declares no JSON body properties.
    body_properties: Vec<String>,
}

impl ToolInvoker {
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        client: ApiClient,
        method: HttpMethod,
        template: impl Into<String>,
        params: &[ConcreteParameter],
        body: Option<&BodySchema>,
    ) -> Self {
        let names_in = |location: ParamLocation| -> Vec<String> {
            params
                .iter()
                .filter(|p| p.location == location)
                .map(|p| p.name.clone())
                .collect()
        };
        Self {
            tool_name: tool_name.into(),
            client,
            method,
            template: template.into(),
            path_params: names_in(ParamLocation::Path),
            query_params: names_in(ParamLocation::Query),
            body_properties: body
                .map(|b| b.property_names().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Partition `args` into path, query and body parts.
    #[must_use]
    pub fn build_request(&self, args: &JsonObject) -> ApiRequest {
        let mut request = ApiRequest::new(self.method, self.substitute_path(args));

        for name in &self.query_params {
            match args.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        request.query.push((name.clone(), value_to_string(item)));
                    }
                }
                Some(value) => request.query.push((name.clone(), value_to_string(value))),
            }
        }

        if !self.body_properties.is_empty() {
            let body: Map<String, Value> = self
                .body_properties
                .iter()
                .filter_map(|name| args.get(name).map(|v| (name.clone(), v.clone())))
                .collect();
            request.body = Some(Value::Object(body));
        }

        request
    }

    /// Run one call. Always returns exactly one text content block.
    pub async fn invoke(&self, args: &JsonObject) -> CallToolResult {
        let request = self.build_request(args);
        tracing::debug!(
            tool = %self.tool_name,
            method = %self.method,
            path = %request.path,
            "invoking tool"
        );

        match self.client.send(request).await {
            Ok(body) => success_result(normalize_response(&Payload::from(body))),
            Err(e) => {
                tracing::warn!(
                    tool = %self.tool_name,
                    method = %self.method,
                    error = %e,
                    "tool invocation failed"
                );
                error_result(&failure_message(&e))
            }
        }
    }

    /// Replace `{name}` placeholders with percent-encoded argument values.
    ///
    /// Placeholder names match declared path parameters case-insensitively. Placeholders with no
    /// matching parameter, or whose argument is absent or `null`, are left as written.
    fn substitute_path(&self, args: &JsonObject) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            out.push_str(&rest[..open]);
            let placeholder = &rest[open + 1..close];
            let value = self
                .path_params
                .iter()
                .find(|p| p.eq_ignore_ascii_case(placeholder))
                .and_then(|p| args.get(p))
                .filter(|v| !v.is_null());
            match value {
                Some(v) => out.push_str(&encode_path_segment(&value_to_string(v))),
                None => out.push_str(&rest[open..=close]),
            }
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Single text block, no error flag.
#[must_use]
pub fn success_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// Single `Error: ...` text block with the error flag set.
#[must_use]
pub fn error_result(message: &str) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("{ERROR_PREFIX}{message}"))])
}

/// Best human message for a failed call: the backend's `error` field, then its `message`
/// field, then the transport description.
fn failure_message(err: &HttpToolsError) -> String {
    if let Some(Value::Object(body)) = err.body() {
        match body.get("error") {
            Some(Value::String(s)) => return s.clone(),
            Some(v) if !v.is_null() => return normalize_response(&Payload::from(v.clone())),
            _ => {}
        }
        if let Some(Value::String(m)) = body.get("message") {
            return m.clone();
        }
    }
    err.to_string()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn encode_path_segment(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}
