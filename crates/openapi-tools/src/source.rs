use crate::compile::{CompiledTool, compile_tools};
use crate::config::{BridgeConfig, CompileConfig};
use crate::document::OpenApiDocument;
use crate::error::{OpenApiToolsError, Result};
use crate::loader::{effective_base_url, load_document};
use apibridge_http_tools::client::ApiClient;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use serde_json::Value;
use std::sync::Arc;

/// The compiled tools for one `OpenAPI` document, ready to list and call.
///
/// Cheap to clone; clones share the same tools.
#[derive(Debug, Clone)]
pub struct ToolSet {
    inner: Arc<ToolSetInner>,
}

#[derive(Debug)]
struct ToolSetInner {
    base_url: String,
    spec_title: Option<String>,
    tools: Vec<CompiledTool>,
}

impl ToolSet {
    /// Compile an already-loaded document against `client`.
    #[must_use]
    pub fn from_document(doc: &OpenApiDocument, config: &CompileConfig, client: &ApiClient) -> Self {
        Self {
            inner: Arc::new(ToolSetInner {
                base_url: client.base_url().to_string(),
                spec_title: doc.title().map(str::to_string),
                tools: compile_tools(doc, config, client),
            }),
        }
    }

    /// Load the spec, resolve the base URL, build the client and compile.
    ///
    /// # Errors
    ///
    /// Returns an error if spec loading fails, no usable base URL exists, or the HTTP client
    /// cannot be built.
    pub async fn build(config: &BridgeConfig) -> Result<Self> {
        let doc = load_document(config).await?;
        let base_url = effective_base_url(config, &doc)?;
        let client = ApiClient::new(&base_url, config.timeout())?;

        let set = Self::from_document(&doc, &config.compile, &client);
        tracing::info!(
            "Discovered {} tools from OpenAPI spec '{}'",
            set.len(),
            set.spec_title().unwrap_or(&config.spec)
        );
        Ok(set)
    }

    #[must_use]
    pub fn tools(&self) -> &[CompiledTool] {
        &self.inner.tools
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.tools.is_empty()
    }

    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&CompiledTool> {
        self.inner.tools.iter().find(|t| t.name() == name)
    }

    /// Protocol descriptors for every tool, in compilation order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner.tools.iter().map(CompiledTool::to_mcp_tool).collect()
    }

    /// Call a tool by name.
    ///
    /// `arguments` must be a JSON object (`null` is treated as `{}`). Backend failures come
    /// back as error envelopes, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool name is unknown or `arguments` is not an object.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let tool = self
            .tool(name)
            .ok_or_else(|| OpenApiToolsError::Runtime(format!("Tool not found: {name}")))?;
        let args: JsonObject = match arguments {
            Value::Object(map) => map,
            Value::Null => JsonObject::new(),
            other => {
                return Err(OpenApiToolsError::Runtime(format!(
                    "Tool arguments must be a JSON object, got {other}"
                )));
            }
        };
        Ok(tool.call(&args).await)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn spec_title(&self) -> Option<&str> {
        self.inner.spec_title.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;
    use std::time::Duration;

    fn set() -> ToolSet {
        let doc = OpenApiDocument::from_value(json!({
            "info": { "title": "Demo" },
            "paths": { "/health": { "get": {} } }
        }))
        .unwrap();
        let client = ApiClient::new("http://localhost:9/api", Duration::from_secs(1)).unwrap();
        ToolSet::from_document(&doc, &CompileConfig::default(), &client)
    }

    #[test]
    fn lookup_and_listing() {
        let set = set();
        assert_eq!(set.len(), 1);
        assert!(set.tool("health").is_some());
        assert!(set.tool("nope").is_none());
        assert_eq!(set.list_tools()[0].name, "health");
        assert_eq!(set.spec_title(), Some("Demo"));
        assert_eq!(set.base_url(), "http://localhost:9/api");
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_are_errors() {
        let set = set();
        assert!(matches!(
            set.call_tool("nope", json!({})).await.unwrap_err(),
            OpenApiToolsError::Runtime(_)
        ));
        assert!(matches!(
            set.call_tool("health", json!([1])).await.unwrap_err(),
            OpenApiToolsError::Runtime(_)
        ));
    }

    #[tokio::test]
    async fn build_requires_a_base_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"paths:\n  /health:\n    get: {}\n").unwrap();

        let mut cfg = BridgeConfig::new(file.path().to_string_lossy().to_string());
        let err = ToolSet::build(&cfg).await.unwrap_err();
        assert!(matches!(err, OpenApiToolsError::OpenApi(_)));

        cfg.base_url = Some("http://127.0.0.1:9".to_string());
        let set = ToolSet::build(&cfg).await.unwrap();
        assert_eq!(set.len(), 1);
    }
}
