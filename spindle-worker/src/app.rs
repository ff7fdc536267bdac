//! Remote worker orchestrator: registration, heartbeat, and transcode job
//! polling run concurrently until shutdown.

use std::sync::Arc;
use std::time::Duration;

use spindle_config::WorkerConfig;
use spindle_contracts::agents::RegisterWorkerRequest;
use spindle_model::{WorkerCapabilities, WorkerType};
use spindle_runtime::client::CoordinatorClient;
use spindle_runtime::hwaccel::detect_hw_encoders;
use tokio::signal;
use tracing::{info, warn};

use crate::error::Result;
use crate::poller::{JobPoller, JobPollerConfig};

pub struct Worker {
    config: WorkerConfig,
    coordinator: Arc<CoordinatorClient>,
    poller: Arc<JobPoller>,
}

impl Worker {
    pub async fn bootstrap(config: WorkerConfig) -> Result<Self> {
        let coordinator = Arc::new(CoordinatorClient::new(config.coordinator_url.clone(), config.api_key.clone()));

        let hw_encoders = detect_hw_encoders().await;
        info!(?hw_encoders, "detected hardware encoders");

        let capabilities = WorkerCapabilities {
            hw_encoders: hw_encoders.clone(),
            max_concurrent: config.max_concurrent_transcodes as u32,
            codec_support: vec!["h264".to_string(), "hevc".to_string()],
        };
        coordinator
            .register_worker(&RegisterWorkerRequest {
                worker_id: config.worker_id.clone(),
                worker_type: WorkerType::Remote,
                hostname: hostname(),
                agent_id: None,
                capabilities,
            })
            .await?;
        info!(worker_id = %config.worker_id, "registered with coordinator");

        let poller = Arc::new(JobPoller::new(
            Arc::clone(&coordinator),
            JobPollerConfig {
                worker_id: config.worker_id.clone(),
                staging_dir: config.staging_dir.clone(),
                max_concurrent_transcodes: config.max_concurrent_transcodes,
                hw_encoders,
            },
        ));

        Ok(Self { config, coordinator, poller })
    }

    pub async fn run(self) -> Result<()> {
        let heartbeat = tokio::spawn(heartbeat_loop(Arc::clone(&self.coordinator), self.config.worker_id.clone(), self.config.heartbeat_interval_secs));
        let job_poll = tokio::spawn(job_poll_loop(Arc::clone(&self.poller), self.config.poll_interval_secs));

        shutdown_signal().await;
        info!("shutdown signal received, stopping worker loops");

        heartbeat.abort();
        job_poll.abort();
        Ok(())
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok().map(|s| s.trim().to_string()))
        .unwrap_or_else(|| "spindle-worker".to_string())
}

async fn heartbeat_loop(coordinator: Arc<CoordinatorClient>, worker_id: String, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Err(err) = coordinator.worker_heartbeat(&worker_id).await {
            warn!(error = %err, "heartbeat failed");
        }
    }
}

async fn job_poll_loop(poller: Arc<JobPoller>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Err(err) = poller.poll_once().await {
            warn!(error = %err, "job poll failed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async { signal::ctrl_c().await.expect("failed to install ctrl-c handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
