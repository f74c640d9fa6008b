//! Spec loading: fetch or read, verify, parse.

use crate::config::{BridgeConfig, HashPolicy};
use crate::document::OpenApiDocument;
use crate::error::{OpenApiToolsError, Result};
use apibridge_http_tools::safety::sanitize_reqwest_error;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Raw spec text from an `http(s)` URL or a file path.
///
/// # Errors
///
/// Returns an error if the URL cannot be fetched (including non-2xx responses) or the file
/// cannot be read.
pub async fn load_spec_text(location: &str, timeout: Duration) -> Result<String> {
    if !is_url(location) {
        tracing::info!("Loading OpenAPI spec from {location}");
        return std::fs::read_to_string(location).map_err(|e| {
            OpenApiToolsError::OpenApiSpecReadFile {
                path: location.to_string(),
                source: e,
            }
        });
    }

    tracing::info!("Fetching OpenAPI spec from {location}");
    let fetch_err = |message: String| OpenApiToolsError::OpenApiSpecFetch {
        url: location.to_string(),
        message,
    };
    let url = Url::parse(location).map_err(|e| fetch_err(format!("invalid URL: {e}")))?;

    let mut builder = reqwest::Client::builder();
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }
    let client = builder
        .build()
        .map_err(|e| fetch_err(format!("failed to build HTTP client: {e}")))?;

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_err(sanitize_reqwest_error(&e)))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fetch_err(format!("server returned {status}")));
    }
    resp.text()
        .await
        .map_err(|e| fetch_err(sanitize_reqwest_error(&e)))
}

/// `sha256:<hex>` digest of the spec text.
#[must_use]
pub fn spec_hash(content: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(content.as_bytes())))
}

/// Compare the spec digest against `expected` according to `policy`.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::SpecHashMismatch`] on mismatch under [`HashPolicy::Fail`].
pub fn verify_spec_hash(content: &str, expected: Option<&str>, policy: HashPolicy) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if policy == HashPolicy::Ignore {
        return Ok(());
    }
    let actual = spec_hash(content);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        return Ok(());
    }
    match policy {
        HashPolicy::Fail => Err(OpenApiToolsError::SpecHashMismatch {
            expected: expected.to_string(),
            actual,
        }),
        HashPolicy::Warn => {
            tracing::warn!(expected, actual = %actual, "OpenAPI spec hash mismatch");
            Ok(())
        }
        HashPolicy::Ignore => Ok(()),
    }
}

/// Parse JSON or YAML spec text (JSON is a YAML subset).
///
/// Non-string mapping keys (YAML `200:` response codes) are stringified.
///
/// # Errors
///
/// Returns an error if the text is not YAML/JSON or its top level is not a usable document.
pub fn parse_document(content: &str, location: &str) -> Result<OpenApiDocument> {
    let raw: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| OpenApiToolsError::OpenApiSpecParse {
            location: location.to_string(),
            source: e,
        })?;
    OpenApiDocument::from_value(yaml_to_json(raw)).map_err(|e| {
        OpenApiToolsError::OpenApiSpecShape {
            location: location.to_string(),
            source: e,
        }
    })
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Load, verify and parse the spec named by `config`.
///
/// # Errors
///
/// Returns an error if loading or parsing fails, or on a hash mismatch under the `fail` policy.
pub async fn load_document(config: &BridgeConfig) -> Result<OpenApiDocument> {
    let content = load_spec_text(&config.spec, config.timeout()).await?;
    verify_spec_hash(
        &content,
        config.spec_hash.as_deref(),
        config.spec_hash_policy,
    )?;
    parse_document(&content, &config.spec)
}

/// Make a server URL absolute.
///
/// `OpenAPI` allows relative server URLs (e.g. `/api/v3`); when the spec itself came from a URL,
/// they are resolved against it.
///
/// # Errors
///
/// Returns an error if `base_url` is relative and cannot be resolved.
pub fn resolve_base_url(spec_location: &str, base_url: &str) -> Result<String> {
    if is_url(base_url) {
        return Ok(base_url.to_string());
    }

    if is_url(spec_location) {
        let mut spec_url = Url::parse(spec_location).map_err(|e| {
            OpenApiToolsError::OpenApi(format!("Invalid OpenAPI spec URL '{spec_location}': {e}"))
        })?;
        spec_url.set_fragment(None);

        let resolved = spec_url.join(base_url).map_err(|e| {
            OpenApiToolsError::OpenApi(format!(
                "Invalid baseUrl '{base_url}': {e} (set baseUrl explicitly)",
            ))
        })?;
        return Ok(resolved.to_string());
    }

    Err(OpenApiToolsError::OpenApi(format!(
        "Invalid baseUrl '{base_url}': must be an absolute http(s) URL (set baseUrl explicitly)",
    )))
}

/// Configured base URL, else the document's first server, made absolute.
///
/// # Errors
///
/// Returns an error if neither is available or the result cannot be made absolute.
pub fn effective_base_url(config: &BridgeConfig, doc: &OpenApiDocument) -> Result<String> {
    let base_url = config
        .base_url
        .as_deref()
        .or_else(|| doc.default_server_url())
        .ok_or_else(|| {
            OpenApiToolsError::OpenApi(
                "No base URL configured and none found in spec".to_string(),
            )
        })?;
    resolve_base_url(&config.spec, base_url)
}
