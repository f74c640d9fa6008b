use anyhow::Context as _;
use apibridge_openapi_tools::{BridgeConfig, ToolSet};
use apibridge_test_support::MockServer;
use axum::Json;
use axum::Router;
use axum::extract::{Path, RawQuery};
use axum::http::StatusCode;
use axum::routing::get;
use rmcp::model::CallToolResult;
use serde_json::{Value, json};
use std::time::Duration;

const SPEC: &str = r"
openapi: 3.0.3
info:
  title: Messaging
parameters:
  Limit:
    name: limit
    in: query
    schema:
      type: integer
paths:
  /chats/{chat_id}/messages:
    parameters:
      - name: chat_id
        in: path
        required: true
        schema:
          type: string
    get:
      summary: List messages
      parameters:
        - $ref: '#/parameters/Limit'
        - name: tag
          in: query
          schema:
            type: array
    post:
      summary: Send a message
      description: <p>Posts <b>text</b> to the chat.</p>
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [text]
              properties:
                text:
                  type: string
                silent:
                  type: boolean
  /fail:
    get: {}
  /slow:
    get: {}
  /text:
    get: {}
  /empty:
    delete: {}
";

fn backend() -> Router {
    Router::new()
        .route(
            "/chats/{chat_id}/messages",
            get(
                |Path(chat_id): Path<String>, RawQuery(query): RawQuery| async move {
                    Json(json!({ "chat_id": chat_id, "query": query }))
                },
            )
            .post(
                |Path(chat_id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({ "chat_id": chat_id, "sent": body }))
                },
            ),
        )
        .route(
            "/fail",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "bad request" })),
                )
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        )
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/empty",
            axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
        )
}

fn text_of(result: &CallToolResult) -> anyhow::Result<String> {
    let v = serde_json::to_value(result)?;
    let content = v["content"].as_array().context("content array")?;
    anyhow::ensure!(content.len() == 1, "expected exactly one content block");
    Ok(content[0]["text"].as_str().context("text block")?.to_string())
}

async fn tool_set(server: &MockServer) -> anyhow::Result<(ToolSet, tempfile::TempDir)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let spec_path = dir.path().join("openapi.yaml");
    std::fs::write(&spec_path, SPEC).context("write spec")?;

    let mut cfg = BridgeConfig::new(spec_path.to_string_lossy().to_string());
    cfg.base_url = Some(server.base_url());
    cfg.timeout_secs = 1;
    let set = ToolSet::build(&cfg).await.context("build tool set")?;
    Ok((set, dir))
}

#[tokio::test]
async fn lists_tools_with_schemas() -> anyhow::Result<()> {
    let server = MockServer::start(backend()).await?;
    let (set, _dir) = tool_set(&server).await?;

    let names: Vec<String> = set.list_tools().iter().map(|t| t.name.to_string()).collect();
    assert_eq!(
        names,
        [
            "chats_messages_get",
            "chats_messages_post",
            "fail",
            "slow",
            "text",
            "empty"
        ]
    );

    let post = set.tool("chats_messages_post").context("post tool")?;
    assert_eq!(post.description(), "Send a message\n\nPosts **text** to the chat.");
    let schema = Value::Object(post.input_schema().to_json_schema());
    assert_eq!(schema["required"], json!(["chat_id", "text"]));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn get_substitutes_path_and_builds_query() -> anyhow::Result<()> {
    let server = MockServer::start(backend()).await?;
    let (set, _dir) = tool_set(&server).await?;

    let result = set
        .call_tool(
            "chats_messages_get",
            json!({ "chat_id": "c 1", "limit": 5, "tag": ["a", "b"] }),
        )
        .await?;
    assert_eq!(result.is_error, Some(false));
    let payload: Value = serde_json::from_str(&text_of(&result)?)?;
    assert_eq!(payload["chat_id"], json!("c 1"));
    assert_eq!(payload["query"], json!("limit=5&tag=a&tag=b"));

    // Optional query arguments that are absent or null are omitted.
    let result = set
        .call_tool("chats_messages_get", json!({ "chat_id": "c1", "limit": null }))
        .await?;
    let payload: Value = serde_json::from_str(&text_of(&result)?)?;
    assert_eq!(payload["query"], Value::Null);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn post_sends_only_body_properties() -> anyhow::Result<()> {
    let server = MockServer::start(backend()).await?;
    let (set, _dir) = tool_set(&server).await?;

    let result = set
        .call_tool(
            "chats_messages_post",
            json!({ "chat_id": "c1", "text": "hi", "silent": true, "extra": 1 }),
        )
        .await?;
    assert_eq!(result.is_error, Some(false));
    let payload: Value = serde_json::from_str(&text_of(&result)?)?;
    assert_eq!(payload["chat_id"], json!("c1"));
    assert_eq!(payload["sent"], json!({ "text": "hi", "silent": true }));

    let result = set
        .call_tool("chats_messages_post", json!({ "chat_id": "c1" }))
        .await?;
    assert_eq!(result.is_error, Some(true));
    assert_eq!(text_of(&result)?, "Error: Invalid arguments: 'text' is required");

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failures_become_error_envelopes() -> anyhow::Result<()> {
    let server = MockServer::start(backend()).await?;
    let (set, _dir) = tool_set(&server).await?;

    let result = set.call_tool("fail", json!({})).await?;
    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result)?.contains("bad request"));

    let result = set.call_tool("slow", Value::Null).await?;
    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result)?.starts_with("Error: "));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn scalar_and_empty_bodies_are_normalized() -> anyhow::Result<()> {
    let server = MockServer::start(backend()).await?;
    let (set, _dir) = tool_set(&server).await?;

    let result = set.call_tool("text", json!({})).await?;
    assert_eq!(text_of(&result)?, "\"plain text\"");

    let result = set.call_tool("empty", json!({})).await?;
    assert_eq!(result.is_error, Some(false));
    assert_eq!(text_of(&result)?, "null");

    server.shutdown().await;
    Ok(())
}
