//! Sponsor tree maintenance CLI

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sponsor_tree::{
    config::{Args, Command, LogFormat},
    db::{MongoClient, MongoTreeStore},
    tree::NodeId,
    NetworkService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr, command output to stdout
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("sponsor_tree={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    let policy = args.policy();
    info!(
        database = %args.mongodb_db,
        horizon = policy.generation_horizon,
        pair_reward = policy.pair_reward,
        "Starting sponsor-tree"
    );

    let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    let store = Arc::new(MongoTreeStore::new(&mongo).await?);
    let service = NetworkService::new(store, policy);

    match args.command {
        Command::Recompute { node_id } => {
            let id: NodeId = node_id.parse()?;
            let report = service.recompute_ancestors(&id).await;
            print_json(&report)?;
            if let Some(reason) = &report.interrupted {
                warn!(node_id = %id, reason = %reason, "Propagation stopped early");
                std::process::exit(2);
            }
        }
        Command::Report { root_id } => {
            let id: NodeId = root_id.parse()?;
            print_json(&service.generation_report(&id).await?)?;
        }
        Command::Headcount { root_id, depth } => {
            let id: NodeId = root_id.parse()?;
            print_json(&service.generation_headcount(&id, depth).await?)?;
        }
        Command::Balance { node_id } => {
            let id: NodeId = node_id.parse()?;
            print_json(&service.effective_balance(&id).await?)?;
        }
        Command::Reconcile => {
            let summary = service.reconcile_all().await?;
            print_json(&summary)?;
            if summary.failed > 0 {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
