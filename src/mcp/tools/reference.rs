//! Reference tools - tagging entities with terms.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::{Reference, ReferenceFilter, ReferenceId, TermId};
use crate::pagination::{paginate, PageRequest};
use crate::services::ReferenceService;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for set_references and unset_references.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReferenceParams {
    pub term_id: i64,
    /// Namespace name.
    pub namespace: String,
    /// Opaque ids of the external entities.
    pub entity_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListReferencesParams {
    /// Groups of term ids. A reference matches when its entity has some term
    /// of every group (OR within a group, AND across groups).
    #[serde(default)]
    pub term_groups: Vec<Vec<i64>>,
    /// Namespace names (any of).
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Entity ids (any of).
    #[serde(default)]
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntityTermsParams {
    /// Namespace name.
    pub namespace: String,
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SetReferencesResult {
    pub references: Vec<Reference>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UnsetReferencesResult {
    pub removed: u64,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = reference_tools, vis = "pub(crate)")]
impl McpServer {
    /// Existing references for the same term, namespace and entities are
    /// replaced, so calling it twice is harmless.
    #[tool(
        description = "Attach a term to entities in a namespace. Replaces existing references for those entities; duplicate entity ids are ignored."
    )]
    pub async fn set_references(
        &self,
        Parameters(params): Parameters<ReferenceParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            term = params.term_id,
            namespace = %params.namespace,
            entities = params.entity_ids.len(),
            "Running set_references tool"
        );

        let references = self
            .resolve::<ReferenceService>()
            .create(TermId(params.term_id), &params.namespace, params.entity_ids)
            .await?;

        Response::json(SetReferencesResult {
            count: references.len(),
            references,
        })
        .into()
    }

    #[tool(description = "Detach a term from entities in a namespace.")]
    pub async fn unset_references(
        &self,
        Parameters(params): Parameters<ReferenceParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            term = params.term_id,
            namespace = %params.namespace,
            "Running unset_references tool"
        );

        let removed = self
            .resolve::<ReferenceService>()
            .delete(TermId(params.term_id), &params.namespace, params.entity_ids)
            .await?;

        Response::json(UnsetReferencesResult { removed }).into()
    }

    #[tool(
        description = "List references filtered by term groups, namespaces and entities. Paginate with first/after."
    )]
    pub async fn list_references(
        &self,
        Parameters(params): Parameters<ListReferencesParams>,
    ) -> Result<CallToolResult, McpError> {
        let service = self.resolve::<ReferenceService>();
        let filter = ReferenceFilter {
            term_groups: params
                .term_groups
                .into_iter()
                .map(|group| group.into_iter().map(TermId).collect())
                .collect(),
            namespaces: params.namespaces,
            entity_ids: params.entity_ids,
            ..Default::default()
        };

        let page = paginate(
            PageRequest::new(params.first, params.after),
            &self.ctx.config.pagination,
            ReferenceId::from_cursor_key,
            |after, limit| async move {
                service
                    .get(&ReferenceFilter {
                        after,
                        limit: Some(limit),
                        ..filter
                    })
                    .await
            },
            |reference: &Reference| reference.id.to_cursor_key(),
        )
        .await?;

        tracing::debug!(count = page.edges.len(), "Listed references");
        Response(page, params.output_format).into()
    }

    #[tool(
        description = "Get the terms attached to each entity in a namespace, in the order the entities were given."
    )]
    pub async fn get_entity_terms(
        &self,
        Parameters(params): Parameters<EntityTermsParams>,
    ) -> Result<CallToolResult, McpError> {
        let entities = self
            .resolve::<ReferenceService>()
            .get_terms_by_entities(&params.namespace, &params.entity_ids)
            .await?;

        Response(entities, params.output_format).into()
    }
}
