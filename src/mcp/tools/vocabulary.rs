//! Vocabulary tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::Deserialize;

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::{
    ParentFilter, Patch, Vocabulary, VocabularyFilter, VocabularyId, VocabularyInput,
    VocabularyPatch,
};
use crate::pagination::{paginate, PageRequest};
use crate::services::VocabularyService;

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateVocabularyParams {
    /// Name, unique among vocabularies with the same parent.
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Parent vocabulary id; omit for a top-level vocabulary.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Parameters for update_vocabulary.
///
/// `clear_description` and `clear_parent` remove the stored value; a
/// supplied value takes precedence over the matching clear flag.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateVocabularyParams {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub clear_description: bool,
    /// New parent vocabulary id.
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Move the vocabulary to the top level.
    #[serde(default)]
    pub clear_parent: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VocabularyIdParams {
    pub id: i64,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListVocabulariesParams {
    /// Exact name match.
    #[serde(default)]
    pub name: Option<String>,
    /// Only direct children of this vocabulary.
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Only top-level vocabularies. Ignored when parent_id is given.
    #[serde(default)]
    pub root_only: bool,
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

impl ListVocabulariesParams {
    fn parent(&self) -> Option<ParentFilter> {
        match (self.parent_id, self.root_only) {
            (Some(id), _) => Some(ParentFilter::Of(VocabularyId(id))),
            (None, true) => Some(ParentFilter::Root),
            (None, false) => None,
        }
    }
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = vocabulary_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(description = "Create a vocabulary, optionally under a parent vocabulary.")]
    pub async fn create_vocabulary(
        &self,
        Parameters(params): Parameters<CreateVocabularyParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(name = %params.name, parent = ?params.parent_id, "Running create_vocabulary tool");

        let vocabulary = self
            .resolve::<VocabularyService>()
            .create(VocabularyInput {
                name: params.name,
                title: params.title,
                description: params.description,
                parent_id: params.parent_id.map(VocabularyId),
            })
            .await?;

        Response::json(vocabulary).into()
    }

    /// Re-parenting rejects the vocabulary itself and any of its descendants.
    #[tool(
        description = "Update a vocabulary. Omitted fields are kept; clear_description and clear_parent remove values."
    )]
    pub async fn update_vocabulary(
        &self,
        Parameters(params): Parameters<UpdateVocabularyParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running update_vocabulary tool");

        let patch = VocabularyPatch {
            name: params.name,
            title: params.title,
            description: Patch::from_parts(params.description, params.clear_description),
            parent_id: Patch::from_parts(params.parent_id.map(VocabularyId), params.clear_parent),
        };
        let vocabulary = self
            .resolve::<VocabularyService>()
            .update(VocabularyId(params.id), patch)
            .await?;

        Response::json(vocabulary).into()
    }

    #[tool(description = "Delete a vocabulary. Fails while any term belongs to it.")]
    pub async fn delete_vocabulary(
        &self,
        Parameters(params): Parameters<VocabularyIdParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running delete_vocabulary tool");

        self.resolve::<VocabularyService>()
            .delete(VocabularyId(params.id))
            .await?;

        Response::json(serde_json::json!({ "deleted": params.id })).into()
    }

    #[tool(description = "Get a vocabulary by id.")]
    pub async fn get_vocabulary(
        &self,
        Parameters(params): Parameters<VocabularyIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let vocabulary = self
            .resolve::<VocabularyService>()
            .get_by_id(VocabularyId(params.id))
            .await?;

        Response(vocabulary, params.output_format).into()
    }

    #[tool(
        description = "List vocabularies by name and parent (or top-level only). Paginate with first/after."
    )]
    pub async fn list_vocabularies(
        &self,
        Parameters(params): Parameters<ListVocabulariesParams>,
    ) -> Result<CallToolResult, McpError> {
        let service = self.resolve::<VocabularyService>();
        let filter = VocabularyFilter {
            name: params.name.clone(),
            parent: params.parent(),
            ..Default::default()
        };

        let page = paginate(
            PageRequest::new(params.first, params.after),
            &self.ctx.config.pagination,
            VocabularyId::from_cursor_key,
            |after, limit| async move {
                service
                    .get(&VocabularyFilter {
                        after,
                        limit: Some(limit),
                        ..filter
                    })
                    .await
            },
            |vocabulary: &Vocabulary| vocabulary.id.to_cursor_key(),
        )
        .await?;

        tracing::debug!(count = page.edges.len(), "Listed vocabularies");
        Response(page, params.output_format).into()
    }
}
