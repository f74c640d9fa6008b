use crate::collect::EndpointKey;
use apibridge_http_tools::method::HttpMethod;
use std::collections::HashSet;

/// Include/exclude policy over endpoint keys.
///
/// A non-empty include list is authoritative: only listed endpoints are kept and the exclude
/// list is not consulted. With an empty include list, everything not excluded is kept.
#[derive(Debug, Clone, Default)]
pub struct EndpointFilter {
    include: HashSet<String>,
    exclude: HashSet<String>,
}

impl EndpointFilter {
    #[must_use]
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().map(|e| canonical_entry(e)).collect(),
            exclude: exclude.iter().map(|e| canonical_entry(e)).collect(),
        }
    }

    #[must_use]
    pub fn allows(&self, key: &EndpointKey) -> bool {
        let key = key.to_string();
        if self.include.is_empty() {
            !self.exclude.contains(&key)
        } else {
            self.include.contains(&key)
        }
    }
}

/// `"GET: Messages"` → `"get:/messages"`. Entries without a `:` or with an unknown method are
/// kept as-is and never match.
fn canonical_entry(entry: &str) -> String {
    let entry = entry.trim();
    let Some((method, path)) = entry.split_once(':') else {
        return entry.to_ascii_lowercase();
    };
    match method.parse::<HttpMethod>() {
        Ok(method) => EndpointKey::new(method, path).to_string(),
        Err(e) => {
            tracing::debug!(%entry, error = %e, "endpoint filter entry never matches");
            entry.to_ascii_lowercase()
        }
    }
}
