//! Backend API client used by every compiled tool.
//!
//! One `ApiClient` is bound to a base URL and a per-request timeout. It is cheap to clone and
//! safe to share across concurrent invocations (the underlying `reqwest::Client` pools
//! connections internally).

use crate::method::HttpMethod;
use crate::safety::sanitize_reqwest_error;
use base64::Engine as _;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum HttpToolsError {
    #[error("config error: {0}")]
    Config(String),
    /// The backend answered with a non-2xx status. `body` is the decoded response body.
    #[error("API returned {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: Value,
    },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http transport error: {0}")]
    Transport(String),
}

impl HttpToolsError {
    /// Decoded backend body carried by a status failure, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            HttpToolsError::Status { body, .. } if !body.is_null() => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpToolsError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout(sanitize_reqwest_error(&value))
        } else {
            Self::Transport(sanitize_reqwest_error(&value))
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpToolsError>;

/// A single outbound call, already partitioned into its HTTP parts.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the client's base URL (e.g. `/pets/42`).
    pub path: String,
    /// Query pairs in emission order. Repeated keys are allowed.
    pub query: Vec<(String, String)>,
    /// JSON body, if the operation has one.
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client bound to `base_url`.
    ///
    /// A zero `timeout` disables the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute `http(s)` URL or if the underlying
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| HttpToolsError::Config(format!("Invalid baseUrl '{base_url}': {e}")))?;
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(HttpToolsError::Config(format!(
                "Invalid baseUrl '{base_url}': unsupported URL scheme '{scheme}'"
            )));
        }

        let mut builder = Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HttpToolsError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Join `path` onto the base URL (keeping any base path prefix) and append `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined string is not a valid URL.
    pub fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        let mut url = Url::parse(&joined)
            .map_err(|e| HttpToolsError::Config(format!("Invalid URL '{joined}': {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }

        Ok(url)
    }

    /// Issue one request and decode the response body.
    ///
    /// 2xx responses yield the decoded body: parsed JSON when possible, otherwise the raw text;
    /// an empty body decodes to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::Status`] for non-2xx responses (carrying the decoded body),
    /// [`HttpToolsError::Timeout`] when the request exceeds the client timeout, and
    /// [`HttpToolsError::Transport`] for connection-level failures.
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.build_url(&request.path, &request.query)?;
        tracing::debug!(method = %request.method, path = %request.path, "sending API request");

        let mut builder = self.client.request(request.method.to_reqwest(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes, content_type.as_deref());

        if status.is_success() {
            Ok(body)
        } else {
            Err(HttpToolsError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            })
        }
    }
}

fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string())),
        Err(_) => {
            let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
            json!({
                "encoding": "base64",
                "mimeType": content_type,
                "data": b64
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{Method, StatusCode, Uri};
    use axum::routing::{any, get};
    use apibridge_test_support::{MockServer, unreachable_base_url};

    async fn echo_handler(method: Method, uri: Uri, body: Bytes) -> axum::Json<Value> {
        axum::Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query().unwrap_or(""),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    #[test]
    fn build_url_keeps_base_path_prefix() {
        let client = ApiClient::new("https://api.example.com/v1/", Duration::from_secs(5))
            .expect("client");
        let url = client
            .build_url(
                "/pets/42",
                &[
                    ("tag".to_string(), "a b".to_string()),
                    ("tag".to_string(), "c".to_string()),
                ],
            )
            .expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/v1/pets/42?tag=a+b&tag=c");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ApiClient::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, HttpToolsError::Config(_)));
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn decode_body_falls_back_to_text_and_null() {
        assert_eq!(decode_body(b"", None), Value::Null);
        assert_eq!(decode_body(b"{\"a\":1}", None), json!({"a": 1}));
        assert_eq!(decode_body(b"plain", None), json!("plain"));
        let binary = decode_body(&[0xff, 0xfe], Some("application/octet-stream"));
        assert_eq!(binary["encoding"], json!("base64"));
        assert_eq!(binary["mimeType"], json!("application/octet-stream"));
    }

    #[tokio::test]
    async fn send_builds_method_path_query_and_body() {
        let server = MockServer::start(Router::new().route("/{*path}", any(echo_handler)))
            .await
            .expect("server");
        let client = ApiClient::new(&server.base_url(), Duration::from_secs(5)).expect("client");

        let mut req = ApiRequest::new(HttpMethod::Post, "/items/7");
        req.query.push(("limit".to_string(), "10".to_string()));
        req.body = Some(json!({"name": "x"}));

        let out = client.send(req).await.expect("send");
        assert_eq!(out["method"], json!("POST"));
        assert_eq!(out["path"], json!("/items/7"));
        assert_eq!(out["query"], json!("limit=10"));
        let body: Value =
            serde_json::from_str(out["body"].as_str().expect("body str")).expect("json body");
        assert_eq!(body, json!({"name": "x"}));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn send_maps_non_2xx_to_status_error_with_body() {
        let app = Router::new().route(
            "/fail",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"error": "bad request"})),
                )
            }),
        );
        let server = MockServer::start(app).await.expect("server");
        let client = ApiClient::new(&server.base_url(), Duration::from_secs(5)).expect("client");

        let err = client
            .send(ApiRequest::new(HttpMethod::Get, "/fail"))
            .await
            .unwrap_err();
        match &err {
            HttpToolsError::Status { status, body, .. } => {
                assert_eq!(*status, 400);
                assert_eq!(body["error"], json!("bad request"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "API returned 400 Bad Request");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn send_times_out() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let server = MockServer::start(app).await.expect("server");
        let client = ApiClient::new(&server.base_url(), Duration::from_millis(100)).expect("client");

        let err = client
            .send(ApiRequest::new(HttpMethod::Get, "/slow"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpToolsError::Timeout(_)), "got {err:?}");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn send_reports_connection_failure_as_transport_error() {
        let base = unreachable_base_url().expect("base url");
        let client = ApiClient::new(&base, Duration::from_secs(2)).expect("client");
        let err = client
            .send(ApiRequest::new(HttpMethod::Get, "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpToolsError::Transport(_)), "got {err:?}");
    }
}
