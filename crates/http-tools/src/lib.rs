//! HTTP plumbing shared by apibridge tools.
//!
//! This crate owns the outbound side only: a pooled client bound to one backend base URL,
//! the closed set of HTTP methods tools can be compiled for, and the method semantics that end
//! up in tool annotations. It knows nothing about `OpenAPI`.

pub mod client;
pub mod method;
pub mod safety;
pub mod semantics;
