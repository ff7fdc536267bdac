//! Agent orchestrator: registration, heartbeat, disc detection, job
//! polling, and VLC preview delivery all run as independent loops under
//! one Tokio runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use spindle_config::AgentConfig;
use spindle_contracts::agents::RegisterAgentRequest;
use spindle_contracts::discs::{DetectedTitleInput, DiscDetectedRequest};
use spindle_model::AgentCapabilities;
use spindle_runtime::client::CoordinatorClient;
use spindle_runtime::hwaccel::detect_hw_encoders;
use spindle_runtime::lockfile::InstanceLock;
use tokio::signal;
use tracing::{error, info, warn};

use crate::disc_detector::{DiscDetector, DiscEvent};
use crate::error::Result;
use crate::makemkv::MakeMkv;
use crate::poller::{JobPoller, JobPollerConfig};
use crate::vlc;

const VLC_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct Agent {
    config: AgentConfig,
    coordinator: Arc<CoordinatorClient>,
    makemkv: Arc<MakeMkv>,
    poller: Arc<JobPoller>,
    _lock: InstanceLock,
}

impl Agent {
    pub async fn bootstrap(config: AgentConfig) -> Result<Self> {
        let lock = InstanceLock::acquire(&config.lockfile_path)?;

        let coordinator = Arc::new(CoordinatorClient::new(config.coordinator_url.clone(), config.api_key.clone()));
        let makemkv = Arc::new(MakeMkv::new(PathBuf::from("makemkvcon")));

        let hw_encoders = detect_hw_encoders().await;
        info!(?hw_encoders, "detected hardware encoders");

        let capabilities = AgentCapabilities { can_rip: config.can_rip, can_transcode: config.can_transcode };
        coordinator
            .register_agent(&RegisterAgentRequest {
                agent_id: config.agent_id.clone(),
                name: config.agent_id.clone(),
                capabilities,
            })
            .await?;
        info!(agent_id = %config.agent_id, "registered with coordinator");

        let poller = Arc::new(JobPoller::new(
            Arc::clone(&coordinator),
            Arc::clone(&makemkv),
            JobPollerConfig {
                agent_id: config.agent_id.clone(),
                staging_dir: config.staging_dir.clone(),
                ffmpeg_path: PathBuf::from("ffmpeg"),
                thumbnail_offsets: thumbnail_offsets(config.thumbnail_count),
                max_concurrent_transcodes: config.max_concurrent_transcodes,
                cleanup_after_upload: config.cleanup_after_upload,
                hw_encoders: hw_encoders.clone(),
            },
        ));

        Ok(Self { config, coordinator, makemkv, poller, _lock: lock })
    }

    /// Runs every loop concurrently until SIGINT/SIGTERM.
    pub async fn run(self) -> Result<()> {
        let heartbeat = tokio::spawn(heartbeat_loop(Arc::clone(&self.coordinator), self.config.agent_id.clone(), self.config.heartbeat_interval_secs));

        let detector_handle = if self.config.can_rip {
            let drives = default_drives();
            Some(tokio::spawn(disc_detection_loop(
                Arc::clone(&self.coordinator),
                Arc::clone(&self.makemkv),
                self.config.agent_id.clone(),
                drives,
                self.config.poll_interval_secs,
            )))
        } else {
            None
        };

        let job_poll = tokio::spawn(job_poll_loop(Arc::clone(&self.poller), self.config.poll_interval_secs));
        let vlc_poll = tokio::spawn(vlc_poll_loop(Arc::clone(&self.coordinator), self.config.agent_id.clone()));

        shutdown_signal().await;
        info!("shutdown signal received, stopping agent loops");

        heartbeat.abort();
        if let Some(handle) = detector_handle {
            handle.abort();
        }
        job_poll.abort();
        vlc_poll.abort();

        Ok(())
    }
}

fn thumbnail_offsets(count: u32) -> Vec<u64> {
    // evenly spaced markers excluding 0 and the (unknown) end; the
    // title's actual duration is applied by the thumbnail extractor.
    (1..=count).map(|i| i as u64 * 120).collect()
}

fn default_drives() -> Vec<String> {
    std::env::var("SPINDLE_DRIVES")
        .ok()
        .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_else(|| vec!["/dev/sr0".to_string()])
}

async fn heartbeat_loop(coordinator: Arc<CoordinatorClient>, agent_id: String, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Err(err) = coordinator.agent_heartbeat(&agent_id).await {
            warn!(error = %err, "heartbeat failed");
        }
    }
}

async fn disc_detection_loop(coordinator: Arc<CoordinatorClient>, makemkv: Arc<MakeMkv>, agent_id: String, drives: Vec<String>, interval_secs: u64) {
    let mut detector = DiscDetector::new(drives);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        for event in detector.poll(&makemkv).await {
            match event {
                DiscEvent::Inserted { drive, analysis } => {
                    let titles = analysis
                        .titles
                        .iter()
                        .map(|t| DetectedTitleInput {
                            index: t.index,
                            name: t.name.clone(),
                            duration_seconds: t.duration_seconds,
                            size_bytes: t.size_bytes,
                            chapters: t.chapters,
                        })
                        .collect();

                    let req = DiscDetectedRequest {
                        agent_id: agent_id.clone(),
                        drive: drive.clone(),
                        disc_name: analysis.disc_name,
                        disc_type: spindle_model::DiscType::Unknown,
                        titles,
                    };
                    match coordinator.disc_detected(&req).await {
                        Ok(disc) => info!(disc_id = %disc.id, drive, "disc detected and registered"),
                        Err(err) => error!(drive, error = %err, "failed to register detected disc"),
                    }
                }
                DiscEvent::Ejected { drive } => {
                    info!(drive, "disc ejected");
                    if let Err(err) = coordinator.disc_ejected(&spindle_contracts::discs::DiscEjectedRequest { agent_id: agent_id.clone(), drive }).await {
                        warn!(error = %err, "failed to report disc ejection");
                    }
                }
            }
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

async fn vlc_poll_loop(coordinator: Arc<CoordinatorClient>, agent_id: String) {
    let vlc_path = vlc_executable_path();
    let mut ticker = tokio::time::interval(VLC_POLL_INTERVAL);
    loop {
        ticker.tick().await;
        if let Err(err) = vlc::poll_and_run(&coordinator, &agent_id, &vlc_path).await {
            warn!(error = %err, "vlc poll failed");
        }
    }
}

fn vlc_executable_path() -> PathBuf {
    std::env::var("SPINDLE_VLC_PATH").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("vlc"))
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
