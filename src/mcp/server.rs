//! MCP server implementation for the taxonomy.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, ServerHandler},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool_handler,
};

use crate::context::Context;
use crate::di::FromRef;

/// Taxonomy MCP server.
///
/// Exposes every namespace, vocabulary, term and reference operation as a
/// tool. Tools are thin: they map parameters onto a service call and render
/// the result.
#[derive(Clone)]
pub struct McpServer {
    pub(crate) ctx: Arc<Context>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    pub fn new(ctx: Context) -> Self {
        tracing::info!("Initializing taxonomy MCP server");

        Self {
            ctx: Arc::new(ctx),
            tool_router: Self::tool_router(),
        }
    }

    /// Build the combined tool router from all tool modules.
    fn tool_router() -> ToolRouter<Self> {
        Self::namespace_tools()
            + Self::vocabulary_tools()
            + Self::term_tools()
            + Self::reference_tools()
    }

    /// Resolve a dependency from the context.
    pub fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(&self.ctx)
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"Taxonomy MCP Server

Hierarchical vocabularies of terms, attached to external entities through
namespace-scoped references.

## Concepts

- **Vocabularies**: named groupings of terms forming a tree (e.g. Display → Matrix type)
- **Terms**: values in one or more vocabularies, with optional super/sub terms
- **Namespaces**: scopes for entity ids (e.g. "catalog")
- **References**: a term attached to an entity id inside a namespace

## Namespace Tools

- **create_namespace** / **update_namespace** / **delete_namespace**
- **get_namespace** - by id or name
- **list_namespaces**

## Vocabulary Tools

- **create_vocabulary** / **update_vocabulary** / **delete_vocabulary**
- **get_vocabulary**
- **list_vocabularies** - by name, parent or top level only

## Term Tools

- **create_term** / **update_term** / **delete_term**
- **get_term**
- **list_terms** - by vocabulary, super term, sub term or name

## Reference Tools

- **set_references** - attach a term to entities (idempotent)
- **unset_references** - detach a term from entities
- **list_references** - term groups are ANDed, terms inside a group are ORed
- **get_entity_terms** - terms of each entity

List tools return `edges` with cursors and `page_info`; pass
`page_info.end_cursor` as `after` to get the next page.
"#
                .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_router_registers_every_tool() {
        let server = McpServer::new(Context::in_memory(Config::default()));
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();

        for expected in [
            "create_namespace",
            "list_vocabularies",
            "update_term",
            "set_references",
            "get_entity_terms",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
        assert_eq!(names.len(), 19);
    }
}
