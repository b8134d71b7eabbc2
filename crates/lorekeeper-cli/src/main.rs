//! CLI entry point for the Lorekeeper relationship engine.
//!
//! Writes JSON results to stdout and logs to stderr. Failures print a JSON
//! error object to stderr and exit with a code per error kind:
//! 2 bad request, 3 not found, 4 forbidden, 1 anything else.

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use lorekeeper_core::config::Settings;
use lorekeeper_core::{ErrorKind, Principal, PropertyBag};
use lorekeeper_graph::{
    CreatedRelationship, DeletedRelationship, GraphClient, GraphConfig, LinkRequest, RelatedNode,
    RelatedQuery, RelationshipError, UnlinkRequest,
};

#[derive(Parser)]
#[command(name = "lorekeeper")]
#[command(about = "Link, unlink, and traverse nodes of the Lorekeeper worldbuilding graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// User id to act as. Required. Whoever runs this tool vouches for it.
    #[arg(long, global = true)]
    as_user: Option<Uuid>,

    /// Config file prefix (default: lorekeeper).
    #[arg(short, long, default_value = "lorekeeper", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a relationship, or update the existing one of the same type.
    Link {
        /// Start node kind, e.g. `characters`.
        start_kind: String,
        start_id: Uuid,
        /// End node kind, e.g. `factions`.
        end_kind: String,
        end_id: Uuid,
        /// Relationship type, e.g. `MEMBER_OF`.
        rel_type: String,
        /// Relationship properties as a JSON object.
        #[arg(long, value_parser = parse_properties)]
        props: Option<PropertyBag>,
    },
    /// Delete one relationship of a given type.
    Unlink {
        start_kind: String,
        start_id: Uuid,
        end_kind: String,
        end_id: Uuid,
        /// Relationship type to delete. Required.
        #[arg(long = "type")]
        rel_type: Option<String>,
    },
    /// List the neighbours of a node.
    Related {
        kind: String,
        id: Uuid,
        /// outgoing, incoming, or both.
        #[arg(long)]
        direction: Option<String>,
        /// Only follow relationships of this type.
        #[arg(long = "type")]
        rel_type: Option<String>,
        /// Only return neighbours of this kind, e.g. `locations`.
        #[arg(long)]
        end_kind: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Created(CreatedRelationship),
    Deleted(DeletedRelationship),
    Related(Vec<RelatedNode>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let principal = resolve_principal(&cli)?;
    tracing::debug!(user = %principal.user_id(), "Acting as user");

    let settings = Settings::load(&cli.config)?;
    let graph = GraphClient::connect(&GraphConfig::from(settings.neo4j)).await?;

    match execute(&graph, cli.command, &principal).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            let report = serde_json::json!({ "error": e.kind(), "message": e.to_string() });
            eprintln!("{report}");
            std::process::exit(exit_code(e.kind()));
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn execute(
    graph: &GraphClient,
    command: Command,
    principal: &Principal,
) -> Result<Output, RelationshipError> {
    match command {
        Command::Link {
            start_kind,
            start_id,
            end_kind,
            end_id,
            rel_type,
            props,
        } => {
            let request =
                LinkRequest::parse(&start_kind, start_id, &end_kind, end_id, &rel_type, props)?;
            let created = graph.create_relationship(&request, principal).await?;
            Ok(Output::Created(created))
        }
        Command::Unlink {
            start_kind,
            start_id,
            end_kind,
            end_id,
            rel_type,
        } => {
            let request = UnlinkRequest::parse(
                &start_kind,
                start_id,
                &end_kind,
                end_id,
                rel_type.as_deref(),
            )?;
            let deleted = graph.delete_relationship(&request, principal).await?;
            Ok(Output::Deleted(deleted))
        }
        Command::Related {
            kind,
            id,
            direction,
            rel_type,
            end_kind,
        } => {
            let request = RelatedQuery::parse(
                &kind,
                id,
                direction.as_deref(),
                rel_type.as_deref(),
                end_kind.as_deref(),
            )?;
            let related = graph.related(&request, principal).await?;
            Ok(Output::Related(related))
        }
    }
}

fn resolve_principal(cli: &Cli) -> anyhow::Result<Principal> {
    let user = cli
        .as_user
        .ok_or_else(|| anyhow::anyhow!("--as-user is required"))?;
    Ok(Principal::from_verified_subject(user))
}

fn parse_properties(raw: &str) -> Result<PropertyBag, String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("properties must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::BadRequest => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Forbidden => 4,
        ErrorKind::Internal => 1,
    }
}
