//! Reference subcommands.

use clap::Subcommand;
use color_eyre::Result;

use crate::context::Context;
use crate::di::FromRef;
use crate::models::{Reference, ReferenceFilter, ReferenceId, TermId};
use crate::pagination::{paginate, PageRequest};
use crate::services::ReferenceService;

use super::{print_json, IdList};

#[derive(Subcommand)]
pub enum ReferenceCommand {
    /// Attach a term to entities, replacing existing references for them
    Set {
        term: i64,
        namespace: String,
        #[arg(required = true)]
        entities: Vec<String>,
    },

    /// Detach a term from entities
    Unset {
        term: i64,
        namespace: String,
        #[arg(required = true)]
        entities: Vec<String>,
    },

    /// List references
    List {
        /// Term group, comma separated; repeat for more groups. An entity
        /// matches when it has some term of every group.
        #[arg(long)]
        group: Vec<IdList>,
        /// Namespace name; repeat for more
        #[arg(long)]
        namespace: Vec<String>,
        /// Entity id; repeat for more
        #[arg(long)]
        entity: Vec<String>,
        #[arg(long)]
        first: Option<usize>,
        #[arg(long)]
        after: Option<String>,
    },

    /// Show the terms attached to each entity
    Terms {
        namespace: String,
        #[arg(required = true)]
        entities: Vec<String>,
    },
}

impl ReferenceCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let service = ReferenceService::from_ref(ctx);

        match self {
            ReferenceCommand::Set {
                term,
                namespace,
                entities,
            } => print_json(&service.create(TermId(term), &namespace, entities).await?),
            ReferenceCommand::Unset {
                term,
                namespace,
                entities,
            } => {
                let removed = service.delete(TermId(term), &namespace, entities).await?;
                print_json(&serde_json::json!({ "removed": removed }))
            }
            ReferenceCommand::List {
                group,
                namespace,
                entity,
                first,
                after,
            } => {
                let filter = ReferenceFilter {
                    term_groups: group
                        .into_iter()
                        .map(|ids| ids.0.into_iter().map(TermId).collect())
                        .collect(),
                    namespaces: namespace,
                    entity_ids: entity,
                    ..Default::default()
                };
                let page = paginate(
                    PageRequest::new(first, after),
                    &ctx.config.pagination,
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
                print_json(&page)
            }
            ReferenceCommand::Terms {
                namespace,
                entities,
            } => print_json(&service.get_terms_by_entities(&namespace, &entities).await?),
        }
    }
}
