//! Taxonomy service
//!
//! Hierarchical vocabularies of terms, and namespace-scoped references that
//! attach terms to external entities. Exposed through a CLI and an MCP server
//! on top of a shared service layer.

pub mod cli;
pub mod config;
pub mod context;
pub mod cursor;
pub mod db;
pub mod di;
pub mod error;
pub mod mcp;
pub mod migrations;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod services;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
