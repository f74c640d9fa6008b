//! Document + policy → callable tools.

use crate::collect::{EndpointKey, collect_operations};
use crate::config::CompileConfig;
use crate::document::{OpenApiDocument, Operation};
use crate::filter::EndpointFilter;
use crate::invoke::{ToolInvoker, error_result};
use crate::markdown::normalize_description;
use crate::naming::assign_names;
use crate::resolver::resolve_parameters;
use crate::schema::{InputSchema, synthesize};
use apibridge_http_tools::client::ApiClient;
use apibridge_http_tools::method::HttpMethod;
use apibridge_http_tools::semantics::annotations_for_method;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use std::sync::Arc;

/// One operation compiled into a callable tool. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledTool {
    name: String,
    description: String,
    key: EndpointKey,
    operation_id: Option<String>,
    input_schema: InputSchema,
    invoker: ToolInvoker,
}

impl CompiledTool {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.key.method
    }

    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    #[must_use]
    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Protocol descriptor with JSON Schema input and method-derived annotations.
    #[must_use]
    pub fn to_mcp_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(self.input_schema.to_json_schema()),
        );
        tool.annotations = Some(annotations_for_method(self.key.method));
        tool
    }

    /// Validate `args` against the input schema, then invoke the backend.
    ///
    /// Invalid arguments produce an error envelope without any request being sent.
    pub async fn call(&self, args: &JsonObject) -> CallToolResult {
        if let Err(violations) = self.input_schema.validate(args) {
            tracing::debug!(tool = %self.name, %violations, "rejecting tool arguments");
            return error_result(&format!("Invalid arguments: {violations}"));
        }
        self.invoker.invoke(args).await
    }
}

/// Compile every operation the policy admits.
///
/// Deterministic for a given document and config: order follows path declaration order, then
/// method order. Entries that cannot be used are skipped, never fatal.
#[must_use]
pub fn compile_tools(
    doc: &OpenApiDocument,
    config: &CompileConfig,
    client: &ApiClient,
) -> Vec<CompiledTool> {
    let filter = EndpointFilter::new(&config.include_endpoints, &config.exclude_endpoints);
    let collected: Vec<_> = collect_operations(doc)
        .into_iter()
        .filter(|c| filter.allows(&c.key))
        .collect();

    let endpoints: Vec<(HttpMethod, &str)> = collected
        .iter()
        .map(|c| (c.method, c.path.as_str()))
        .collect();
    let names = assign_names(&config.tool_prefix, &endpoints);

    let tools: Vec<CompiledTool> = collected
        .iter()
        .zip(names)
        .map(|(c, name)| {
            let params = resolve_parameters(&c.path_parameters, &c.operation.parameters, doc);
            let body = c.operation.body_schema();
            let input_schema = synthesize(&params, body.as_ref(), config.html_to_markdown);
            let invoker = ToolInvoker::new(
                name.clone(),
                client.clone(),
                c.method,
                c.template.clone(),
                &params,
                body.as_ref(),
            );
            tracing::debug!(tool = %name, endpoint = %c.key, "compiled tool");
            CompiledTool {
                description: describe(&c.operation, c.method, &c.template, config.html_to_markdown),
                name,
                key: c.key.clone(),
                operation_id: c.operation.operation_id.clone(),
                input_schema,
                invoker,
            }
        })
        .collect();

    tracing::info!(tools = tools.len(), "compiled OpenAPI tools");
    tools
}

/// Summary and description joined by a blank line; `Calls GET /path` when both are missing.
fn describe(op: &Operation, method: HttpMethod, template: &str, html_to_markdown: bool) -> String {
    let parts: Vec<String> = [op.summary.as_deref(), op.description.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| normalize_description(s, html_to_markdown))
        .collect();
    if parts.is_empty() {
        format!("Calls {} {template}", method.as_str().to_ascii_uppercase())
    } else {
        parts.join("\n\n")
    }
}
