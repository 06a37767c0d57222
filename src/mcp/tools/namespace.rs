//! Namespace tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::Deserialize;

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::{Namespace, NamespaceId, NamespaceInput, NamespacePatch};
use crate::pagination::{paginate, PageRequest};
use crate::services::NamespaceService;

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNamespaceParams {
    /// Unique namespace name (e.g., "catalog", "blog-posts").
    pub name: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateNamespaceParams {
    pub id: i64,
    /// New name (optional).
    #[serde(default)]
    pub name: Option<String>,
    /// New title (optional).
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NamespaceIdParams {
    pub id: i64,
}

/// Parameters for get_namespace. Exactly one of `id` or `name` is used; `id`
/// wins when both are given.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetNamespaceParams {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListNamespacesParams {
    /// Page size.
    #[serde(default)]
    pub first: Option<usize>,
    /// Cursor of the last item of the previous page.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = namespace_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(description = "Create a namespace that scopes entity references.")]
    pub async fn create_namespace(
        &self,
        Parameters(params): Parameters<CreateNamespaceParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(name = %params.name, "Running create_namespace tool");

        let namespace = self
            .resolve::<NamespaceService>()
            .create(NamespaceInput {
                name: params.name,
                title: params.title,
            })
            .await?;

        Response::json(namespace).into()
    }

    #[tool(description = "Rename or retitle a namespace. Omitted fields are kept.")]
    pub async fn update_namespace(
        &self,
        Parameters(params): Parameters<UpdateNamespaceParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running update_namespace tool");

        let namespace = self
            .resolve::<NamespaceService>()
            .update(
                NamespaceId(params.id),
                NamespacePatch {
                    name: params.name,
                    title: params.title,
                },
            )
            .await?;

        Response::json(namespace).into()
    }

    /// Fails while any reference exists in the namespace.
    #[tool(description = "Delete a namespace. Fails while it still holds references.")]
    pub async fn delete_namespace(
        &self,
        Parameters(params): Parameters<NamespaceIdParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running delete_namespace tool");

        self.resolve::<NamespaceService>()
            .delete(NamespaceId(params.id))
            .await?;

        Response::json(serde_json::json!({ "deleted": params.id })).into()
    }

    #[tool(description = "Get a namespace by id or by name.")]
    pub async fn get_namespace(
        &self,
        Parameters(params): Parameters<GetNamespaceParams>,
    ) -> Result<CallToolResult, McpError> {
        let service = self.resolve::<NamespaceService>();

        let namespace = match (params.id, params.name.as_deref()) {
            (Some(id), _) => service.get_by_id(NamespaceId(id)).await?,
            (None, Some(name)) => service.get_by_name(name).await?,
            (None, None) => {
                return Err(McpError::invalid_params(
                    "either id or name is required",
                    None,
                ))
            }
        };

        Response(namespace, params.output_format).into()
    }

    #[tool(description = "List namespaces in id order. Paginate with first/after.")]
    pub async fn list_namespaces(
        &self,
        Parameters(params): Parameters<ListNamespacesParams>,
    ) -> Result<CallToolResult, McpError> {
        let service = self.resolve::<NamespaceService>();

        let page = paginate(
            PageRequest::new(params.first, params.after),
            &self.ctx.config.pagination,
            NamespaceId::from_cursor_key,
            |after, limit| async move { service.get(after, Some(limit)).await },
            |namespace: &Namespace| namespace.id.to_cursor_key(),
        )
        .await?;

        tracing::debug!(count = page.edges.len(), "Listed namespaces");
        Response(page, params.output_format).into()
    }
}
