mod cli;
mod config;
mod error;
mod logging;

use anyhow::Context as _;
use apibridge_openapi_tools::ToolSet;
use clap::Parser as _;
use cli::{Cli, Command};
use error::AdapterError;
use serde_json::Value;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    let cfg = config::bridge_config(&cli.source)?;
    let tools = ToolSet::build(&cfg)
        .await
        .with_context(|| format!("load tools from '{}'", cfg.spec))?;
    tracing::debug!(base_url = tools.base_url(), "backend resolved");

    match cli.command {
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tools.list_tools())?);
            } else {
                for tool in tools.tools() {
                    let summary = tool.description().lines().next().unwrap_or_default();
                    println!("{}\t{}\t{}", tool.name(), tool.key(), summary);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Schema { tool } => {
            let compiled = tools
                .tool(&tool)
                .with_context(|| format!("unknown tool '{tool}'"))?;
            let schema = Value::Object(compiled.input_schema().to_json_schema());
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Call { tool, args } => {
            let args: Value = serde_json::from_str(&args).map_err(AdapterError::Arguments)?;
            let result = tools
                .call_tool(&tool, args)
                .await
                .map_err(AdapterError::from)
                .with_context(|| format!("call tool '{tool}'"))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_error == Some(true) {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
