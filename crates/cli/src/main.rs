//! FireProx CLI
//!
//! Create, inspect, retarget and tear down AWS API Gateway pass-through
//! proxies from the command line.

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fireprox_gateway::ProxyManager;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use crate::settings::{FileSettings, SessionArgs};

/// FireProx: rotating-IP HTTP pass-through proxies on AWS API Gateway.
#[derive(Parser, Debug)]
#[command(name = "fireprox", version, about)]
struct Cli {
    #[command(flatten)]
    session: SessionArgs,

    /// TOML file with an `[aws]` table. Flags take precedence.
    #[arg(long, env = "FIREPROX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a proxy for an origin URL.
    Create(commands::proxies::CreateArgs),
    /// List proxies in the region.
    List(commands::proxies::ListArgs),
    /// Show a single proxy.
    Get(commands::proxies::GetArgs),
    /// Point a proxy at a new origin.
    Update(commands::proxies::UpdateArgs),
    /// Delete a proxy.
    Delete(commands::proxies::DeleteArgs),
    /// Set the owner tag of a proxy.
    Tag(commands::proxies::TagArgs),
    /// Show the account behind the current credentials.
    Whoami,
    /// Delete every proxy in the region.
    DeleteAll(commands::delete_all::DeleteAllArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let backend = cli.session.resolve(file)?.connect().await?;

    let bulk_delete = matches!(&cli.command, Command::DeleteAll(args) if args.enable_bulk_delete);
    let manager = ProxyManager::builder(backend)
        .enable_bulk_delete(bulk_delete)
        .build();
    debug!(region = %manager.region(), bulk_delete, "proxy manager ready");

    match cli.command {
        Command::Create(args) => commands::proxies::create(&manager, &args, &cli.format).await,
        Command::List(args) => commands::proxies::list(&manager, &args, &cli.format).await,
        Command::Get(args) => commands::proxies::get(&manager, &args, &cli.format).await,
        Command::Update(args) => commands::proxies::update(&manager, &args, &cli.format).await,
        Command::Delete(args) => commands::proxies::delete(&manager, &args, &cli.format).await,
        Command::Tag(args) => commands::proxies::tag(&manager, &args, &cli.format).await,
        Command::Whoami => commands::whoami::run(&manager, &cli.format).await,
        Command::DeleteAll(args) => commands::delete_all::run(&manager, &args, &cli.format).await,
    }
}
