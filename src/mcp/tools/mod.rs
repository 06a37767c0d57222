//! MCP tool implementations organized by domain.

pub mod namespace;
pub mod reference;
pub mod term;
pub mod vocabulary;
