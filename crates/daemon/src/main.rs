//! `tsic` — the Team Sync Intelligence Core daemon.
//!
//! In place of the desktop shell this workspace's sibling product ships
//! behind, this binary wires the library crates together behind a small
//! CLI: `serve` runs the sync orchestrator for every registered user until
//! interrupted, `sync-now` runs one cycle for a single user and exits,
//! `ask` answers a question through the context assembly service.

mod context;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use context::AppContext;
use tsic_core::services::context::AskOptions;

#[derive(Parser)]
#[command(name = "tsic")]
#[command(about = "Team Sync Intelligence Core daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync orchestrator for every user named in `TSIC_USERS`
    /// (comma-separated) until interrupted.
    Serve,

    /// Run one sync cycle for a single user and exit.
    SyncNow {
        /// User id to sync.
        #[arg(long)]
        user: String,
    },

    /// Ask a question through the context assembly service.
    Ask {
        /// User id the question is asked on behalf of.
        #[arg(long)]
        user: String,

        /// The question text.
        #[arg(long)]
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(error = ?err, "no .env file loaded");
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::bootstrap()?;

    match cli.command {
        Commands::Serve => run_serve(ctx).await?,
        Commands::SyncNow { user } => run_sync_now(ctx, &user).await?,
        Commands::Ask { user, question } => run_ask(ctx, &user, &question).await?,
    }

    Ok(())
}

async fn run_serve(ctx: AppContext) -> anyhow::Result<()> {
    let users = std::env::var("TSIC_USERS").unwrap_or_default();
    let users: Vec<&str> = users.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

    if users.is_empty() {
        tracing::warn!("TSIC_USERS is empty; no sync workers will be started");
    }

    for user in &users {
        ctx.orchestrator.register_user(user).await;
    }

    info!(user_count = users.len(), "tsic daemon serving");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        signal_token.cancel();
    });
    shutdown.cancelled().await;

    info!("shutdown requested, stopping sync workers");
    ctx.orchestrator.stop_all().await;
    Ok(())
}

async fn run_sync_now(ctx: AppContext, user: &str) -> anyhow::Result<()> {
    ctx.orchestrator.register_user(user).await;
    ctx.orchestrator.sync_now(user).await;
    // register_user already ran one immediate cycle; sync_now's request is
    // only picked up by the still-running worker loop, so give it a beat.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    ctx.orchestrator.unregister_user(user).await;
    println!("sync cycle completed for {user}");
    Ok(())
}

async fn run_ask(ctx: AppContext, user: &str, question: &str) -> anyhow::Result<()> {
    let response = ctx.context_service.ask(user, question, AskOptions::default()).await?;
    println!("{}", response.answer);
    for source in &response.sources {
        println!("- {source:?}");
    }
    Ok(())
}
