//! Term subcommands.

use clap::Subcommand;
use color_eyre::Result;

use crate::context::Context;
use crate::di::FromRef;
use crate::models::{Patch, Term, TermFilter, TermId, TermInput, TermPatch, VocabularyId};
use crate::pagination::{paginate, PageRequest};
use crate::services::TermService;

use super::print_json;

#[derive(Subcommand)]
pub enum TermCommand {
    /// Create a term
    Create {
        name: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Owning vocabulary ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        vocabularies: Vec<i64>,
        /// Super term ids, comma separated
        #[arg(long = "super", value_delimiter = ',')]
        super_terms: Vec<i64>,
        /// Sub term ids, comma separated
        #[arg(long = "sub", value_delimiter = ',')]
        sub_terms: Vec<i64>,
    },

    /// Update a term; supplied id lists replace the stored ones
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, value_delimiter = ',')]
        vocabularies: Option<Vec<i64>>,
        #[arg(long = "super", value_delimiter = ',')]
        super_terms: Option<Vec<i64>>,
        #[arg(long = "sub", value_delimiter = ',')]
        sub_terms: Option<Vec<i64>>,
    },

    /// Delete a term that no reference points to
    Delete { id: i64 },

    /// Show a term
    Get { id: i64 },

    /// List terms
    List {
        /// Vocabulary ids, comma separated (any of)
        #[arg(long, value_delimiter = ',')]
        vocabularies: Vec<i64>,
        /// Only terms below this term
        #[arg(long = "super")]
        super_term: Option<i64>,
        /// Only terms above this term
        #[arg(long = "sub")]
        sub_term: Option<i64>,
        #[arg(long)]
        name: Option<String>,
        /// Skip this many matches
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        first: Option<usize>,
        #[arg(long)]
        after: Option<String>,
    },
}

fn term_ids(raw: Vec<i64>) -> Vec<TermId> {
    raw.into_iter().map(TermId).collect()
}

fn vocabulary_ids(raw: Vec<i64>) -> Vec<VocabularyId> {
    raw.into_iter().map(VocabularyId).collect()
}

impl TermCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let service = TermService::from_ref(ctx);

        match self {
            TermCommand::Create {
                name,
                title,
                description,
                vocabularies,
                super_terms,
                sub_terms,
            } => {
                let input = TermInput {
                    name,
                    title,
                    description,
                    vocabulary_ids: vocabulary_ids(vocabularies),
                    super_term_ids: term_ids(super_terms),
                    sub_term_ids: term_ids(sub_terms),
                };
                print_json(&service.create(input).await?)
            }
            TermCommand::Update {
                id,
                name,
                title,
                description,
                clear_description,
                vocabularies,
                super_terms,
                sub_terms,
            } => {
                let patch = TermPatch {
                    name,
                    title,
                    description: Patch::from_parts(description, clear_description),
                    vocabulary_ids: vocabularies.map(vocabulary_ids),
                    super_term_ids: super_terms.map(term_ids),
                    sub_term_ids: sub_terms.map(term_ids),
                };
                print_json(&service.update(TermId(id), patch).await?)
            }
            TermCommand::Delete { id } => {
                service.delete(TermId(id)).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            TermCommand::Get { id } => print_json(&service.get_by_id(TermId(id)).await?),
            TermCommand::List {
                vocabularies,
                super_term,
                sub_term,
                name,
                offset,
                first,
                after,
            } => {
                let filter = TermFilter {
                    vocabulary_ids: vocabulary_ids(vocabularies),
                    super_term: super_term.map(TermId),
                    sub_term: sub_term.map(TermId),
                    name,
                    offset,
                    ..Default::default()
                };
                let page = paginate(
                    PageRequest::new(first, after),
                    &ctx.config.pagination,
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
                print_json(&page)
            }
        }
    }
}
