mod app;
mod error;
mod poller;
mod transcode;

use clap::{Parser, Subcommand};
use spindle_config::{WorkerArgs, WorkerConfig};
use tracing_subscriber::EnvFilter;

use crate::app::Worker;

#[derive(Parser)]
#[command(name = "spindle-worker", about = "Spindle remote transcode worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    worker_args: WorkerArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the worker's registration/heartbeat/poll loops (default).
    Run,
    /// Print the worker's version and exit.
    Version,
    /// Validate configuration and exit without registering.
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
            println!("spindle-worker {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check => {
            let config = WorkerConfig::resolve(cli.worker_args)?;
            println!("config ok: worker_id={} coordinator_url={}", config.worker_id, config.coordinator_url);
            Ok(())
        }
        Command::Run => run(cli.worker_args).await,
    }
}

async fn run(args: WorkerArgs) -> anyhow::Result<()> {
    let config = WorkerConfig::resolve(args)?;
    let worker = Worker::bootstrap(config).await?;
    worker.run().await?;
    Ok(())
}
