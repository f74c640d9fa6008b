//! `OpenAPI` operations compiled into callable tools.
//!
//! The pipeline runs once per document:
//! [`resolver`] → [`collect`] → [`filter`] → [`naming`] → [`schema`] + [`invoke`], assembled by
//! [`compile::compile_tools`]. Each resulting [`compile::CompiledTool`] is then called
//! independently; responses go through [`normalize`] on the way out.
//!
//! [`loader`] and [`source::ToolSet`] wrap the pipeline with spec loading and base URL
//! resolution for binaries.

pub mod collect;
pub mod compile;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod invoke;
pub mod loader;
pub mod markdown;
pub mod naming;
pub mod normalize;
pub mod resolver;
pub mod schema;
pub mod source;

pub use compile::{CompiledTool, compile_tools};
pub use config::{BridgeConfig, CompileConfig, HashPolicy};
pub use error::{OpenApiToolsError, Result};
pub use source::ToolSet;
