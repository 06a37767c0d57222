//! Model Context Protocol (MCP) server for the taxonomy.
//!
//! The server uses compile-time dependency injection via the `Context`
//! struct. Services are resolved at tool execution time using `FromRef`.
//!
//! - `server`: MCP server implementation with tool router
//! - `protocol`: response rendering and cursor pagination
//! - `tools`: tool implementations organized by domain

pub mod protocol;
pub(crate) mod server;
mod tools;

pub use server::McpServer;
