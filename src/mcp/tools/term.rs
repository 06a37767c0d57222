//! Term tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::Deserialize;

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::{Patch, Term, TermFilter, TermId, TermInput, TermPatch, VocabularyId};
use crate::pagination::{paginate, PageRequest};
use crate::services::TermService;

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTermParams {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Owning vocabularies (at least one).
    pub vocabulary_ids: Vec<i64>,
    #[serde(default)]
    pub super_term_ids: Vec<i64>,
    #[serde(default)]
    pub sub_term_ids: Vec<i64>,
}

/// Parameters for update_term. Supplied id lists replace the stored ones.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTermParams {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub clear_description: bool,
    #[serde(default)]
    pub vocabulary_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub super_term_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub sub_term_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TermIdParams {
    pub id: i64,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTermsParams {
    /// Terms in any of these vocabularies.
    #[serde(default)]
    pub vocabulary_ids: Vec<i64>,
    /// Terms directly below this term.
    #[serde(default)]
    pub super_term_id: Option<i64>,
    /// Terms directly above this term.
    #[serde(default)]
    pub sub_term_id: Option<i64>,
    /// Exact name match.
    #[serde(default)]
    pub name: Option<String>,
    /// Skip this many matches after the cursor.
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

impl ListTermsParams {
    fn filter(&self) -> TermFilter {
        TermFilter {
            vocabulary_ids: vocabulary_ids(self.vocabulary_ids.clone()),
            super_term: self.super_term_id.map(TermId),
            sub_term: self.sub_term_id.map(TermId),
            name: self.name.clone(),
            offset: self.offset,
            ..Default::default()
        }
    }
}

fn term_ids(raw: Vec<i64>) -> Vec<TermId> {
    raw.into_iter().map(TermId).collect()
}

fn vocabulary_ids(raw: Vec<i64>) -> Vec<VocabularyId> {
    raw.into_iter().map(VocabularyId).collect()
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = term_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(description = "Create a term in one or more vocabularies.")]
    pub async fn create_term(
        &self,
        Parameters(params): Parameters<CreateTermParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(name = %params.name, "Running create_term tool");

        let term = self
            .resolve::<TermService>()
            .create(TermInput {
                name: params.name,
                title: params.title,
                description: params.description,
                vocabulary_ids: vocabulary_ids(params.vocabulary_ids),
                super_term_ids: term_ids(params.super_term_ids),
                sub_term_ids: term_ids(params.sub_term_ids),
            })
            .await?;

        Response::json(term).into()
    }

    #[tool(
        description = "Update a term. Omitted fields are kept; supplied id lists replace membership and relations."
    )]
    pub async fn update_term(
        &self,
        Parameters(params): Parameters<UpdateTermParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running update_term tool");

        let patch = TermPatch {
            name: params.name,
            title: params.title,
            description: Patch::from_parts(params.description, params.clear_description),
            vocabulary_ids: params.vocabulary_ids.map(vocabulary_ids),
            super_term_ids: params.super_term_ids.map(term_ids),
            sub_term_ids: params.sub_term_ids.map(term_ids),
        };
        let term = self
            .resolve::<TermService>()
            .update(TermId(params.id), patch)
            .await?;

        Response::json(term).into()
    }

    #[tool(description = "Delete a term. Fails while any reference points to it.")]
    pub async fn delete_term(
        &self,
        Parameters(params): Parameters<TermIdParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = params.id, "Running delete_term tool");

        self.resolve::<TermService>().delete(TermId(params.id)).await?;

        Response::json(serde_json::json!({ "deleted": params.id })).into()
    }

    #[tool(description = "Get a term with its vocabularies, super terms and sub terms.")]
    pub async fn get_term(
        &self,
        Parameters(params): Parameters<TermIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let term = self
            .resolve::<TermService>()
            .get_by_id(TermId(params.id))
            .await?;

        Response(term, params.output_format).into()
    }

    #[tool(
        description = "List terms by vocabulary (any of), super term, sub term or name. Paginate with first/after; offset skips matches."
    )]
    pub async fn list_terms(
        &self,
        Parameters(params): Parameters<ListTermsParams>,
    ) -> Result<CallToolResult, McpError> {
        let service = self.resolve::<TermService>();
        let filter = params.filter();

        let page = paginate(
            PageRequest::new(params.first, params.after),
            &self.ctx.config.pagination,
            TermId::from_cursor_key,
            |after, limit| async move {
                service
                    .get(&TermFilter {
                        after,
                        limit: Some(limit),
                        ..filter
                    })
                    .await
            },
            |term: &Term| term.id.to_cursor_key(),
        )
        .await?;

        tracing::debug!(count = page.edges.len(), "Listed terms");
        Response(page, params.output_format).into()
    }
}
