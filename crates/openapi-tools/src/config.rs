use crate::error::{OpenApiToolsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Policy that decides which operations become tools and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileConfig {
    /// Endpoint keys (`"get:/messages"`) to expose. When non-empty, only these are compiled and
    /// `exclude_endpoints` is ignored.
    #[serde(default)]
    pub include_endpoints: Vec<String>,

    /// Endpoint keys to drop. Only consulted when `include_endpoints` is empty.
    #[serde(default)]
    pub exclude_endpoints: Vec<String>,

    /// Prefix prepended to every tool name (`"tg_"` turns `messages` into `tg_messages`).
    #[serde(default)]
    pub tool_prefix: String,

    /// Convert HTML descriptions to Markdown.
    #[serde(default = "default_true")]
    pub html_to_markdown: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            include_endpoints: Vec::new(),
            exclude_endpoints: Vec::new(),
            tool_prefix: String::new(),
            html_to_markdown: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Hash verification policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail startup if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}

impl std::str::FromStr for HashPolicy {
    type Err = OpenApiToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(HashPolicy::Warn),
            "fail" => Ok(HashPolicy::Fail),
            "ignore" => Ok(HashPolicy::Ignore),
            other => Err(OpenApiToolsError::Config(format!(
                "Invalid spec hash policy '{other}' (expected warn, fail or ignore)"
            ))),
        }
    }
}

/// Everything needed to turn one `OpenAPI` document into a ready tool set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// `OpenAPI` spec location (URL or file path).
    pub spec: String,

    /// Optional spec hash (`sha256:<hex>`) for version detection.
    #[serde(default)]
    pub spec_hash: Option<String>,

    /// Hash policy: warn, fail, or ignore.
    #[serde(default)]
    pub spec_hash_policy: HashPolicy,

    /// Override base URL from spec.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout for backend calls. `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(flatten)]
    pub compile: CompileConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl BridgeConfig {
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            spec_hash: None,
            spec_hash_policy: HashPolicy::default(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            compile: CompileConfig::default(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load a config file (YAML or JSON).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not describe a `BridgeConfig`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: BridgeConfig = serde_yaml::from_str(&content).map_err(|e| {
            OpenApiToolsError::Config(format!("Invalid config file {}: {e}", path.display()))
        })?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_config_defaults_enable_markdown() {
        let cfg: CompileConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.html_to_markdown);
        assert!(cfg.include_endpoints.is_empty());
        assert_eq!(cfg, CompileConfig::default());
    }

    #[test]
    fn bridge_config_reads_flattened_camel_case_yaml() {
        let cfg: BridgeConfig = serde_yaml::from_str(
            r"
spec: ./openapi.yaml
baseUrl: https://api.example.com
timeoutSecs: 5
specHashPolicy: fail
includeEndpoints: ['get:/health']
toolPrefix: tg_
htmlToMarkdown: false
",
        )
        .unwrap();
        assert_eq!(cfg.spec, "./openapi.yaml");
        assert_eq!(cfg.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.spec_hash_policy, HashPolicy::Fail);
        assert_eq!(cfg.compile.include_endpoints, vec!["get:/health"]);
        assert_eq!(cfg.compile.tool_prefix, "tg_");
        assert!(!cfg.compile.html_to_markdown);
    }

    #[test]
    fn bridge_config_defaults() {
        let cfg: BridgeConfig = serde_yaml::from_str("spec: https://x/openapi.json").unwrap();
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.spec_hash_policy, HashPolicy::Warn);
        assert!(cfg.compile.html_to_markdown);
    }

    #[test]
    fn hash_policy_parses() {
        assert_eq!("FAIL".parse::<HashPolicy>().unwrap(), HashPolicy::Fail);
        assert!("sometimes".parse::<HashPolicy>().is_err());
    }
}
