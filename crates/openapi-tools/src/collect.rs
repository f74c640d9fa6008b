//! Path/method matrix walk.

use crate::document::{OpenApiDocument, Operation, ParameterDef};
use apibridge_http_tools::method::HttpMethod;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// `(method, normalized path)`; the unit of include/exclude matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub method: HttpMethod,
    pub path: String,
}

impl EndpointKey {
    #[must_use]
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: normalize_path(path),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.path)
    }
}

/// Lower-case the path and make sure it starts with exactly one `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/').to_lowercase())
}

/// Same leading-slash rule as [`normalize_path`], but case is kept; this is what gets sent.
fn request_template(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

#[derive(Debug, Clone)]
pub struct CollectedOperation {
    pub key: EndpointKey,
    pub method: HttpMethod,
    /// Normalized path (lower-cased).
    pub path: String,
    /// Path template as declared, used to build request URLs.
    pub template: String,
    /// Parameters declared on the path item, shared by every method on it.
    pub path_parameters: Vec<ParameterDef>,
    pub operation: Operation,
}

/// Flatten the document into operations, in path declaration order then [`HttpMethod::ALL`]
/// order.
///
/// Malformed path items and operations are skipped. When two declared paths normalize to the
/// same endpoint key, the first one wins.
#[must_use]
pub fn collect_operations(doc: &OpenApiDocument) -> Vec<CollectedOperation> {
    let mut out = Vec::new();
    let mut seen: HashSet<EndpointKey> = HashSet::new();

    for (raw_path, item) in &doc.paths {
        let Some(item) = item.as_object() else {
            tracing::debug!(path = %raw_path, "skipping path entry that is not an object");
            continue;
        };

        let path_parameters = item
            .get("parameters")
            .map(|raw| path_item_parameters(raw_path, raw))
            .unwrap_or_default();

        for method in HttpMethod::ALL {
            let Some(raw_op) = item.get(method.as_str()) else {
                continue;
            };
            let operation: Operation = match serde_json::from_value(raw_op.clone()) {
                Ok(op) => op,
                Err(e) => {
                    tracing::debug!(
                        path = %raw_path,
                        %method,
                        error = %e,
                        "skipping malformed operation"
                    );
                    continue;
                }
            };

            let key = EndpointKey::new(method, raw_path);
            if !seen.insert(key.clone()) {
                tracing::debug!(endpoint = %key, "skipping duplicate endpoint");
                continue;
            }

            out.push(CollectedOperation {
                path: key.path.clone(),
                key,
                method,
                template: request_template(raw_path),
                path_parameters: path_parameters.clone(),
                operation,
            });
        }
    }

    out
}

fn path_item_parameters(raw_path: &str, raw: &Value) -> Vec<ParameterDef> {
    let Some(items) = raw.as_array() else {
        tracing::debug!(path = %raw_path, "ignoring non-array path item parameters");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|p| match ParameterDef::from_value(p) {
            Ok(def) => Some(def),
            Err(e) => {
                tracing::debug!(path = %raw_path, error = %e, "skipping malformed path item parameter");
                None
            }
        })
        .collect()
}
