use apibridge_openapi_tools::HashPolicy;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "apibridge",
    version,
    about = "List and call tools compiled from an OpenAPI spec"
)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the spec comes from and how it is compiled. Flags override `--config` file values.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// YAML or JSON file holding a full bridge configuration.
    #[arg(long, global = true, env = "APIBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// `OpenAPI` spec location (file path or http(s) URL).
    #[arg(long, global = true, env = "OPENAPI_SPEC")]
    pub spec: Option<String>,

    /// Backend base URL; defaults to the spec's first server.
    #[arg(long, global = true, env = "API_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (`0` disables it).
    #[arg(long, global = true, env = "API_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Endpoints to expose, e.g. `get:/messages`. Takes priority over `--exclude`.
    #[arg(long = "include", global = true, env = "INCLUDE_ENDPOINTS", value_delimiter = ',')]
    pub include_endpoints: Vec<String>,

    /// Endpoints to hide when no include list is given.
    #[arg(long = "exclude", global = true, env = "EXCLUDE_ENDPOINTS", value_delimiter = ',')]
    pub exclude_endpoints: Vec<String>,

    #[arg(long, global = true, env = "TOOL_PREFIX")]
    pub tool_prefix: Option<String>,

    /// Convert HTML descriptions to Markdown (default: true).
    #[arg(long, global = true, env = "HTML_TO_MARKDOWN", value_parser = BoolishValueParser::new())]
    pub html_to_markdown: Option<bool>,

    /// Expected spec digest, `sha256:<hex>`.
    #[arg(long, global = true, env = "SPEC_HASH")]
    pub spec_hash: Option<String>,

    #[arg(long, global = true, env = "SPEC_HASH_POLICY")]
    pub spec_hash_policy: Option<HashPolicy>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every compiled tool.
    List {
        /// Print the protocol tool descriptors as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print one tool's input schema.
    Schema { tool: String },
    /// Call one tool and print the result envelope. Exits with status 1 on a tool error.
    Call {
        tool: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
