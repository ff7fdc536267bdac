//! Spindle coordinator: the HTTP API agents, remote workers, and
//! operators talk to. Owns the durable store, the job queue and
//! assignment engine, the preview pipeline, and the background
//! staleness sweep.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spindle_config::{CoordinatorArgs, CoordinatorConfig};
use spindle_core::metadata::omdb::OmdbProvider;
use spindle_core::metadata::tmdb::TmdbProvider;
use spindle_core::notify::discord::DiscordSink;
use spindle_core::store::postgres::PostgresStore;
use spindle_core::{AgentManager, JobQueue, NotificationSink, NullMovieProvider, NullSink, NullTvProvider, Store, WorkerManager};
use spindle_server::routes;
use spindle_server::state::AppState;

#[derive(Parser)]
#[command(name = "spindle-server", about = "Spindle coordinator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    coordinator_args: CoordinatorArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the coordinator HTTP API (default).
    Run,
    /// Print the coordinator's version and exit.
    Version,
    /// Validate configuration and exit without binding.
    Check,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Version => {
            println!("spindle-server {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check => {
            let config = CoordinatorConfig::resolve(cli.coordinator_args)?;
            println!("config ok: bind_addr={} library_root={}", config.bind_addr, config.library_root.display());
            Ok(())
        }
        Command::Run => run(cli.coordinator_args).await,
    }
}

async fn run(args: CoordinatorArgs) -> anyhow::Result<()> {
    let config = CoordinatorConfig::resolve(args)?;
    info!(bind_addr = %config.bind_addr, "starting spindle coordinator");

    let pool = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    let postgres = PostgresStore::new(pool);
    postgres.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(postgres);

    let tv_provider: Arc<dyn spindle_core::TvMetadataProvider> = match &config.tmdb_api_key {
        Some(key) => Arc::new(TmdbProvider::new(key.clone())),
        None => Arc::new(NullTvProvider),
    };
    let movie_provider: Arc<dyn spindle_core::MovieMetadataProvider> = match &config.omdb_api_key {
        Some(key) => Arc::new(OmdbProvider::new(key.clone())),
        None => Arc::new(NullMovieProvider),
    };
    let notifier: Arc<dyn NotificationSink> = match &config.discord_webhook_url {
        Some(url) => Arc::new(DiscordSink::new(url.clone())),
        None => Arc::new(NullSink),
    };

    let state = AppState {
        agents: Arc::new(AgentManager::new(store.clone())),
        workers: Arc::new(WorkerManager::new(store.clone())),
        jobs: Arc::new(JobQueue::new(store.clone())),
        store,
        tv_provider,
        movie_provider,
        notifier,
        config: Arc::new(config.clone()),
        drive_index: Arc::new(dashmap::DashMap::new()),
    };

    tokio::spawn(sweep_loop(state.clone(), config.agent_timeout_secs, config.worker_timeout_secs, config.sweep_interval_secs));

    let app = routes::create_api_router(state);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically marks agents/workers offline past their heartbeat timeout,
/// evacuating and re-queuing any jobs an offline worker was holding.
async fn sweep_loop(state: AppState, agent_timeout_secs: u64, worker_timeout_secs: u64, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Ok(offline) = state.agents.sweep_stale(chrono::Duration::seconds(agent_timeout_secs as i64)).await {
            for agent_id in offline {
                warn!(agent_id, "agent marked offline by staleness sweep");
            }
        }
        match state
            .workers
            .sweep_stale(chrono::Duration::seconds(worker_timeout_secs as i64), state.notifier.as_ref())
            .await
        {
            Ok(offline) => {
                for worker_id in offline {
                    warn!(worker_id, "worker marked offline by staleness sweep, jobs re-queued for approval");
                }
            }
            Err(err) => warn!(error = %err, "worker staleness sweep failed"),
        }
    }
}
