mod app;
mod disc_detector;
mod error;
mod makemkv;
mod poller;
mod rip;
mod thumbnails;
mod transcode;
mod vlc;

use clap::{Parser, Subcommand};
use spindle_config::{AgentArgs, AgentConfig};
use tracing_subscriber::EnvFilter;

use crate::app::Agent;
use crate::makemkv::MakeMkv;

#[derive(Parser)]
#[command(name = "spindle-agent", about = "Spindle disc/transcode agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    agent_args: AgentArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent's registration/heartbeat/detection/poll loops (default).
    Run,
    /// Print the agent's version and exit.
    Version,
    /// Validate configuration and exit without registering.
    Check,
    /// Probe a single drive letter/device and print the disc analysis.
    ProbeDrive { drive: String },
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
            println!("spindle-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check => {
            let config = AgentConfig::resolve(cli.agent_args)?;
            println!("config ok: agent_id={} coordinator_url={}", config.agent_id, config.coordinator_url);
            Ok(())
        }
        Command::ProbeDrive { drive } => {
            let makemkv = MakeMkv::new(std::path::PathBuf::from("makemkvcon"));
            let analysis = makemkv.analyze_disc(&drive).await?;
            println!("disc: {}", analysis.disc_name);
            for title in &analysis.titles {
                println!("  title {:02} {:>8}s {:>12}b \"{}\"", title.index, title.duration_seconds, title.size_bytes, title.name);
            }
            Ok(())
        }
        Command::Run => run(cli.agent_args).await,
    }
}

async fn run(args: AgentArgs) -> anyhow::Result<()> {
    let config = AgentConfig::resolve(args)?;
    let agent = Agent::bootstrap(config).await?;
    agent.run().await?;
    Ok(())
}
