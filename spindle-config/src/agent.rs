//! Agent (`spindle-agent`) and remote worker (`spindle-worker`) configuration.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::loader;

const CONFIG_FILENAME: &str = "spindle-agent.toml";

#[derive(Debug, Parser, Default)]
#[command(name = "spindle-agent", about = "Spindle disc/transcode agent")]
pub struct AgentArgs {
    #[arg(long, env = "SPINDLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_AGENT_ID")]
    pub agent_id: Option<String>,

    #[arg(long, env = "SPINDLE_COORDINATOR_URL")]
    pub coordinator_url: Option<String>,

    #[arg(long, env = "SPINDLE_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long, env = "SPINDLE_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_HEARTBEAT_INTERVAL_SECS")]
    pub heartbeat_interval_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_RIP_STALL_TIMEOUT_SECS")]
    pub rip_stall_timeout_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_RIP_HARD_TIMEOUT_SECS")]
    pub rip_hard_timeout_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_RIP_ANALYZE_TIMEOUT_SECS")]
    pub rip_analyze_timeout_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_MAX_CONCURRENT_TRANSCODES")]
    pub max_concurrent_transcodes: Option<usize>,

    #[arg(long, env = "SPINDLE_THUMBNAIL_COUNT")]
    pub thumbnail_count: Option<u32>,

    #[arg(long, env = "SPINDLE_CLEANUP_AFTER_UPLOAD")]
    pub cleanup_after_upload: Option<bool>,

    #[arg(long, env = "SPINDLE_LOCKFILE_PATH")]
    pub lockfile_path: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_CAN_RIP")]
    pub can_rip: Option<bool>,

    #[arg(long, env = "SPINDLE_CAN_TRANSCODE")]
    pub can_transcode: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct AgentToml {
    agent_id: Option<String>,
    coordinator_url: Option<String>,
    api_key: Option<String>,
    staging_dir: Option<PathBuf>,
    poll_interval_secs: Option<u64>,
    heartbeat_interval_secs: Option<u64>,
    rip_stall_timeout_secs: Option<u64>,
    rip_hard_timeout_secs: Option<u64>,
    rip_analyze_timeout_secs: Option<u64>,
    max_concurrent_transcodes: Option<usize>,
    thumbnail_count: Option<u32>,
    cleanup_after_upload: Option<bool>,
    lockfile_path: Option<PathBuf>,
    can_rip: Option<bool>,
    can_transcode: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_id: String,
    pub coordinator_url: String,
    pub api_key: Option<String>,
    pub staging_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub rip_stall_timeout_secs: u64,
    pub rip_hard_timeout_secs: u64,
    pub rip_analyze_timeout_secs: u64,
    pub max_concurrent_transcodes: usize,
    pub thumbnail_count: u32,
    pub cleanup_after_upload: bool,
    pub lockfile_path: PathBuf,
    pub can_rip: bool,
    pub can_transcode: bool,
}

impl AgentConfig {
    pub fn load() -> Result<Self> {
        loader::load_dotenv();
        let args = AgentArgs::parse();
        Self::resolve(args)
    }

    pub fn resolve(args: AgentArgs) -> Result<Self> {
        let locations = loader::default_config_locations(CONFIG_FILENAME);
        let toml: AgentToml = loader::load_toml_overlay(args.config.as_deref(), &locations)?;

        let coordinator_url = args
            .coordinator_url
            .or(toml.coordinator_url)
            .ok_or(ConfigError::Missing("coordinator_url"))?;

        let agent_id = args.agent_id.or(toml.agent_id).unwrap_or_else(default_agent_id);

        Ok(Self {
            agent_id,
            coordinator_url,
            api_key: args.api_key.or(toml.api_key),
            staging_dir: args.staging_dir.or(toml.staging_dir).unwrap_or_else(|| PathBuf::from("/var/lib/spindle/staging")),
            poll_interval_secs: args.poll_interval_secs.or(toml.poll_interval_secs).unwrap_or(5),
            heartbeat_interval_secs: args.heartbeat_interval_secs.or(toml.heartbeat_interval_secs).unwrap_or(15),
            rip_stall_timeout_secs: args.rip_stall_timeout_secs.or(toml.rip_stall_timeout_secs).unwrap_or(300),
            rip_hard_timeout_secs: args.rip_hard_timeout_secs.or(toml.rip_hard_timeout_secs).unwrap_or(14_400),
            rip_analyze_timeout_secs: args.rip_analyze_timeout_secs.or(toml.rip_analyze_timeout_secs).unwrap_or(600),
            max_concurrent_transcodes: args.max_concurrent_transcodes.or(toml.max_concurrent_transcodes).unwrap_or(1),
            thumbnail_count: args.thumbnail_count.or(toml.thumbnail_count).unwrap_or(3),
            cleanup_after_upload: args.cleanup_after_upload.or(toml.cleanup_after_upload).unwrap_or(true),
            lockfile_path: args.lockfile_path.or(toml.lockfile_path).unwrap_or_else(|| PathBuf::from("/var/run/spindle-agent.pid")),
            can_rip: args.can_rip.or(toml.can_rip).unwrap_or(true),
            can_transcode: args.can_transcode.or(toml.can_transcode).unwrap_or(true),
        })
    }
}

fn default_agent_id() -> String {
    hostname_or_fallback()
}

fn hostname_or_fallback() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "spindle-agent".to_string())
}

/// Remote worker (`spindle-worker`) shares the agent's config shape minus
/// the rip-specific fields; it registers with `worker.type = remote`.
#[derive(Debug, Parser, Default)]
#[command(name = "spindle-worker", about = "Spindle remote transcode worker")]
pub struct WorkerArgs {
    #[arg(long, env = "SPINDLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_WORKER_ID")]
    pub worker_id: Option<String>,

    #[arg(long, env = "SPINDLE_COORDINATOR_URL")]
    pub coordinator_url: Option<String>,

    #[arg(long, env = "SPINDLE_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long, env = "SPINDLE_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_HEARTBEAT_INTERVAL_SECS")]
    pub heartbeat_interval_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_MAX_CONCURRENT_TRANSCODES")]
    pub max_concurrent_transcodes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct WorkerToml {
    worker_id: Option<String>,
    coordinator_url: Option<String>,
    api_key: Option<String>,
    staging_dir: Option<PathBuf>,
    poll_interval_secs: Option<u64>,
    heartbeat_interval_secs: Option<u64>,
    max_concurrent_transcodes: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub coordinator_url: String,
    pub api_key: Option<String>,
    pub staging_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub max_concurrent_transcodes: usize,
}

impl WorkerConfig {
    pub fn load() -> Result<Self> {
        loader::load_dotenv();
        let args = WorkerArgs::parse();
        Self::resolve(args)
    }

    pub fn resolve(args: WorkerArgs) -> Result<Self> {
        let locations = loader::default_config_locations("spindle-worker.toml");
        let toml: WorkerToml = loader::load_toml_overlay(args.config.as_deref(), &locations)?;

        let coordinator_url = args
            .coordinator_url
            .or(toml.coordinator_url)
            .ok_or(ConfigError::Missing("coordinator_url"))?;

        Ok(Self {
            worker_id: args.worker_id.or(toml.worker_id).unwrap_or_else(default_agent_id),
            coordinator_url,
            api_key: args.api_key.or(toml.api_key),
            staging_dir: args.staging_dir.or(toml.staging_dir).unwrap_or_else(|| PathBuf::from("/var/lib/spindle/staging")),
            poll_interval_secs: args.poll_interval_secs.or(toml.poll_interval_secs).unwrap_or(5),
            heartbeat_interval_secs: args.heartbeat_interval_secs.or(toml.heartbeat_interval_secs).unwrap_or(15),
            max_concurrent_transcodes: args.max_concurrent_transcodes.or(toml.max_concurrent_transcodes).unwrap_or(2),
        })
    }
}
