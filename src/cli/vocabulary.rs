//! Vocabulary subcommands.

use clap::Subcommand;
use color_eyre::Result;

use crate::context::Context;
use crate::di::FromRef;
use crate::models::{
    ParentFilter, Patch, Vocabulary, VocabularyFilter, VocabularyId, VocabularyInput,
    VocabularyPatch,
};
use crate::pagination::{paginate, PageRequest};
use crate::services::VocabularyService;

use super::print_json;

#[derive(Subcommand)]
pub enum VocabularyCommand {
    /// Create a vocabulary
    Create {
        name: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Parent vocabulary id
        #[arg(long)]
        parent: Option<i64>,
    },

    /// Update a vocabulary; omitted flags keep the stored value
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
        /// New parent vocabulary id
        #[arg(long, conflicts_with = "clear_parent")]
        parent: Option<i64>,
        /// Move the vocabulary to the top level
        #[arg(long)]
        clear_parent: bool,
    },

    /// Delete a vocabulary that owns no terms
    Delete { id: i64 },

    /// Show a vocabulary
    Get { id: i64 },

    /// List vocabularies
    List {
        #[arg(long)]
        name: Option<String>,
        /// Only children of this vocabulary
        #[arg(long, conflicts_with = "root")]
        parent: Option<i64>,
        /// Only top-level vocabularies
        #[arg(long)]
        root: bool,
        #[arg(long)]
        first: Option<usize>,
        #[arg(long)]
        after: Option<String>,
    },
}

impl VocabularyCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let service = VocabularyService::from_ref(ctx);

        match self {
            VocabularyCommand::Create {
                name,
                title,
                description,
                parent,
            } => {
                let input = VocabularyInput {
                    name,
                    title,
                    description,
                    parent_id: parent.map(VocabularyId),
                };
                print_json(&service.create(input).await?)
            }
            VocabularyCommand::Update {
                id,
                name,
                title,
                description,
                clear_description,
                parent,
                clear_parent,
            } => {
                let patch = VocabularyPatch {
                    name,
                    title,
                    description: Patch::from_parts(description, clear_description),
                    parent_id: Patch::from_parts(parent.map(VocabularyId), clear_parent),
                };
                print_json(&service.update(VocabularyId(id), patch).await?)
            }
            VocabularyCommand::Delete { id } => {
                service.delete(VocabularyId(id)).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            VocabularyCommand::Get { id } => print_json(&service.get_by_id(VocabularyId(id)).await?),
            VocabularyCommand::List {
                name,
                parent,
                root,
                first,
                after,
            } => {
                let parent = match (parent, root) {
                    (Some(id), _) => Some(ParentFilter::Of(VocabularyId(id))),
                    (None, true) => Some(ParentFilter::Root),
                    (None, false) => None,
                };
                let page = paginate(
                    PageRequest::new(first, after),
                    &ctx.config.pagination,
                    VocabularyId::from_cursor_key,
                    |after, limit| async move {
                        service
                            .get(&VocabularyFilter {
                                name,
                                parent,
                                after,
                                limit: Some(limit),
                                ..Default::default()
                            })
                            .await
                    },
                    |vocabulary: &Vocabulary| vocabulary.id.to_cursor_key(),
                )
                .await?;
                print_json(&page)
            }
        }
    }
}
