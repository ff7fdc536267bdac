//! Coordinator (`spindle-server`) configuration.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use spindle_model::AssignmentStrategy;

use crate::error::{ConfigError, Result};
use crate::loader;

const CONFIG_FILENAME: &str = "spindle.toml";

fn default_assignment_strategy() -> AssignmentStrategy {
    AssignmentStrategy::Priority
}

/// CLI surface. Every flag doubles as a `SPINDLE_`-prefixed env var via
/// clap's `env` feature; unset fields fall through to the TOML overlay,
/// then to the hardcoded defaults in [`CoordinatorConfig::resolve`].
#[derive(Debug, Parser, Default)]
#[command(name = "spindle-server", about = "Spindle coordinator")]
pub struct CoordinatorArgs {
    #[arg(long, env = "SPINDLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_BIND_ADDR")]
    pub bind_addr: Option<String>,

    #[arg(long, env = "SPINDLE_DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "SPINDLE_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long, env = "SPINDLE_LIBRARY_ROOT")]
    pub library_root: Option<PathBuf>,

    #[arg(long, env = "SPINDLE_AGENT_TIMEOUT_SECS")]
    pub agent_timeout_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_WORKER_TIMEOUT_SECS")]
    pub worker_timeout_secs: Option<u64>,

    #[arg(long, env = "SPINDLE_ASSIGNMENT_STRATEGY")]
    pub assignment_strategy: Option<String>,

    #[arg(long, env = "SPINDLE_TMDB_API_KEY")]
    pub tmdb_api_key: Option<String>,

    #[arg(long, env = "SPINDLE_OMDB_API_KEY")]
    pub omdb_api_key: Option<String>,

    #[arg(long, env = "SPINDLE_DISCORD_WEBHOOK_URL")]
    pub discord_webhook_url: Option<String>,

    #[arg(long, env = "SPINDLE_AUTO_APPROVE_PREVIEWS")]
    pub auto_approve_previews: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct CoordinatorToml {
    bind_addr: Option<String>,
    database_url: Option<String>,
    api_key: Option<String>,
    library_root: Option<PathBuf>,
    agent_timeout_secs: Option<u64>,
    worker_timeout_secs: Option<u64>,
    assignment_strategy: Option<String>,
    tmdb_api_key: Option<String>,
    omdb_api_key: Option<String>,
    discord_webhook_url: Option<String>,
    auto_approve_previews: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// `None` means bearer-token auth is disabled.
    pub api_key: Option<String>,
    pub library_root: PathBuf,
    pub agent_timeout_secs: u64,
    pub worker_timeout_secs: u64,
    pub assignment_strategy: AssignmentStrategy,
    pub tmdb_api_key: Option<String>,
    pub omdb_api_key: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub auto_approve_previews: bool,
    pub sweep_interval_secs: u64,
}

impl CoordinatorConfig {
    pub fn load() -> Result<Self> {
        loader::load_dotenv();
        let args = CoordinatorArgs::parse();
        Self::resolve(args)
    }

    pub fn resolve(args: CoordinatorArgs) -> Result<Self> {
        let locations = loader::default_config_locations(CONFIG_FILENAME);
        let toml: CoordinatorToml = loader::load_toml_overlay(args.config.as_deref(), &locations)?;

        let database_url = args
            .database_url
            .or(toml.database_url)
            .ok_or(ConfigError::Missing("database_url"))?;

        let assignment_strategy = match args.assignment_strategy.or(toml.assignment_strategy) {
            Some(raw) => parse_strategy(&raw),
            None => default_assignment_strategy(),
        };

        Ok(Self {
            bind_addr: args.bind_addr.or(toml.bind_addr).unwrap_or_else(|| "0.0.0.0:7979".to_string()),
            database_url,
            api_key: args.api_key.or(toml.api_key),
            library_root: args.library_root.or(toml.library_root).unwrap_or_else(|| PathBuf::from("/srv/library")),
            agent_timeout_secs: args.agent_timeout_secs.or(toml.agent_timeout_secs).unwrap_or(60),
            worker_timeout_secs: args.worker_timeout_secs.or(toml.worker_timeout_secs).unwrap_or(90),
            assignment_strategy,
            tmdb_api_key: args.tmdb_api_key.or(toml.tmdb_api_key),
            omdb_api_key: args.omdb_api_key.or(toml.omdb_api_key),
            discord_webhook_url: args.discord_webhook_url.or(toml.discord_webhook_url),
            auto_approve_previews: args.auto_approve_previews.or(toml.auto_approve_previews).unwrap_or(false),
            sweep_interval_secs: 30,
        })
    }
}

fn parse_strategy(raw: &str) -> AssignmentStrategy {
    match raw {
        "round-robin" => AssignmentStrategy::RoundRobin,
        "load-balance" => AssignmentStrategy::LoadBalance,
        "fastest-first" => AssignmentStrategy::FastestFirst,
        _ => AssignmentStrategy::Priority,
    }
}
