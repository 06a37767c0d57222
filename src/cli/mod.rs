//! CLI module for the taxonomy service.
//!
//! Subcommands:
//! - `init`: Create or upgrade the database schema
//! - `mcp`: Run the MCP server (stdio transport)
//! - `namespace`, `vocabulary`, `term`, `reference`: one subcommand per
//!   service operation, printing JSON to stdout

mod init;
mod mcp;
mod namespace;
mod reference;
mod term;
mod vocabulary;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;

use crate::config::Config;
use crate::context::Context;

pub use namespace::NamespaceCommand;
pub use reference::ReferenceCommand;
pub use term::TermCommand;
pub use vocabulary::VocabularyCommand;

/// Taxonomy service - vocabularies, terms and entity references
#[derive(Parser)]
#[command(name = "taxonomy")]
#[command(about = "Taxonomy service - vocabularies, terms and namespace-scoped entity references")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema
    Init,

    /// Run the MCP server (stdio transport for local use)
    Mcp,

    /// Manage namespaces
    Namespace {
        #[command(subcommand)]
        command: NamespaceCommand,
    },

    /// Manage vocabularies
    Vocabulary {
        #[command(subcommand)]
        command: VocabularyCommand,
    },

    /// Manage terms
    Term {
        #[command(subcommand)]
        command: TermCommand,
    },

    /// Attach terms to entities and query them
    Reference {
        #[command(subcommand)]
        command: ReferenceCommand,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Mcp => self.run_mcp().await,
            Command::Namespace { command } => command.run(&connect().await?).await,
            Command::Vocabulary { command } => command.run(&connect().await?).await,
            Command::Term { command } => command.run(&connect().await?).await,
            Command::Reference { command } => command.run(&connect().await?).await,
        }
    }
}

/// Loads configuration and connects to PostgreSQL.
async fn connect() -> Result<Context> {
    let config = Config::load()?;
    tracing::debug!(uri = %config.postgres.uri, "Connecting to PostgreSQL");
    Ok(Context::connect(config).await?)
}

/// Writes `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A comma separated list of ids given as a single flag value, e.g. one
/// `--group 1,2` term group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdList(pub Vec<i64>);

impl std::str::FromStr for IdList {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| format!("'{}' is not a numeric id", part))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(IdList)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        App::command().debug_assert();
    }

    #[test]
    fn test_id_list_parsing() {
        assert_eq!("1, 2,3".parse::<IdList>().unwrap(), IdList(vec![1, 2, 3]));
        assert_eq!("".parse::<IdList>().unwrap(), IdList(vec![]));
        assert!("1,x".parse::<IdList>().is_err());
    }

    #[test]
    fn test_reference_filter_flags() {
        let app = App::try_parse_from([
            "taxonomy",
            "reference",
            "list",
            "--group",
            "3",
            "--group",
            "1,2",
            "--namespace",
            "catalog",
        ])
        .unwrap();

        match app.command {
            Command::Reference {
                command: ReferenceCommand::List { group, namespace, .. },
            } => {
                assert_eq!(group, vec![IdList(vec![3]), IdList(vec![1, 2])]);
                assert_eq!(namespace, vec!["catalog".to_string()]);
            }
            _ => panic!("expected reference list"),
        }
    }
}
