//! Namespace subcommands.

use clap::Subcommand;
use color_eyre::Result;

use crate::context::Context;
use crate::di::FromRef;
use crate::models::{Namespace, NamespaceId, NamespaceInput, NamespacePatch};
use crate::pagination::{paginate, PageRequest};
use crate::services::NamespaceService;

use super::print_json;

#[derive(Subcommand)]
pub enum NamespaceCommand {
    /// Create a namespace
    Create {
        name: String,
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Rename or retitle a namespace
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },

    /// Delete a namespace that holds no references
    Delete { id: i64 },

    /// Show a namespace by name, or by id with --id
    Get {
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        id: Option<i64>,
    },

    /// List namespaces
    List {
        #[arg(long)]
        first: Option<usize>,
        #[arg(long)]
        after: Option<String>,
    },
}

impl NamespaceCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let service = NamespaceService::from_ref(ctx);

        match self {
            NamespaceCommand::Create { name, title } => {
                print_json(&service.create(NamespaceInput { name, title }).await?)
            }
            NamespaceCommand::Update { id, name, title } => print_json(
                &service
                    .update(NamespaceId(id), NamespacePatch { name, title })
                    .await?,
            ),
            NamespaceCommand::Delete { id } => {
                service.delete(NamespaceId(id)).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            NamespaceCommand::Get { name, id } => {
                let namespace = match (id, name) {
                    (Some(id), _) => service.get_by_id(NamespaceId(id)).await?,
                    (None, Some(name)) => service.get_by_name(&name).await?,
                    (None, None) => color_eyre::eyre::bail!("a name or --id is required"),
                };
                print_json(&namespace)
            }
            NamespaceCommand::List { first, after } => {
                let page = paginate(
                    PageRequest::new(first, after),
                    &ctx.config.pagination,
                    NamespaceId::from_cursor_key,
                    |after, limit| service.get(after, Some(limit)),
                    |namespace: &Namespace| namespace.id.to_cursor_key(),
                )
                .await?;
                print_json(&page)
            }
        }
    }
}
