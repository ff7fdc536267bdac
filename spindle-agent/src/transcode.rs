//! Transcode job execution: concurrent up to `max_concurrent`,
//! hardware-encoder preferred, cancellable mid-run, uploaded with retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spindle_runtime::client::CoordinatorClient;
use spindle_runtime::subprocess::{parse_transcode_progress, run_supervised, LineKind, ProcessLimits, ProgressSink};
use tokio::process::Command;
use tracing::info;

use crate::error::{AgentError, Result};

const CANCEL_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TranscodeSpec {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub preset: String,
    /// Hardware encoder tag (from `WorkerCapabilities.hw_encoders`), if any
    /// is available and the preset doesn't force software.
    pub hw_encoder: Option<String>,
}

pub struct TranscodeOutcome {
    pub cancelled: bool,
}

/// Runs the transcoding subprocess, polling the coordinator for
/// cancellation every ~10s.
pub async fn transcode -> Result<TranscodeOutcome> {
    let cmd = build_command;
    info!;

    let limits = ProcessLimits { stall_timeout: Duration::from_secs(600), hard_timeout: Duration::from_secs(12 * 60 * 60) };

    let cancel_watch = CancelWatch::new(coordinator, job_id);
    let run = run_supervised(cmd, limits, sink.as_ref(), |line| {
        parse_transcode_progress(line).map(LineKind::Transcode)
    });

    tokio::select! {
        outcome = run => {
            let outcome = outcome.map_err(AgentError::from)?;
            if outcome.exit_code != 0 {
                return Err(AgentError::Other(anyhow::anyhow!(
                    "transcoder exited with {}: {}",
                    outcome.exit_code,
                    outcome.tail.join("\n")
                )));
            }
            Ok(TranscodeOutcome { cancelled: false })
        }
        _ = cancel_watch.wait_for_cancel() => {
            Ok(TranscodeOutcome { cancelled: true })
        }
    }
}

fn build_command -> Command {
    let mut cmd = Command::new(executable);
    cmd.arg("-i").arg;
    cmd.arg("-o").arg;
    cmd.arg("--preset").arg;
    if let Some(encoder) = &spec.hw_encoder {
        cmd.arg("--encoder").arg(encoder_flag(encoder));
    }
    cmd
}

fn encoder_flag(tag: &str) -> &'static str {
    match tag {
        "nvenc" => "nvenc_h264",
        "qsv" => "qsv_h264",
        "vaapi" => "vaapi_h264",
        _ => "x264",
    }
}

struct CancelWatch {
    coordinator: Arc<CoordinatorClient>,
    job_id: uuid::Uuid,
}

impl CancelWatch {
    fn new(coordinator: Arc<CoordinatorClient>, job_id: uuid::Uuid) -> Self {
        Self { coordinator, job_id }
    }

    async fn wait_for_cancel(&self) {
        loop {
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
            if let Ok(true) = self.coordinator.is_cancelled(self.job_id).await {
                return;
            }
        }
    }
}

/// Uploads a transcoded file, then deletes local input/output per the
/// configured cleanup flags.
pub async fn upload_and_cleanup(
    coordinator: &CoordinatorClient,
    input_file: &Path,
    output_file: &Path,
    remote_name: &str,
    cleanup_input: bool,
    cleanup_output: bool,
) -> Result<spindle_contracts::jobs::UploadResponse> {
    let resp = coordinator
        .upload_file(output_file, remote_name)
        .await
        .map_err(AgentError::from)?;

    if cleanup_input {
        let _ = tokio::fs::remove_file(input_file).await;
    }
    if cleanup_output {
        let _ = tokio::fs::remove_file(output_file).await;
    }

    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_flag_maps_known_tags() {
        assert_eq!(encoder_flag("nvenc"), "nvenc_h264");
        assert_eq!(encoder_flag("unknown"), "x264");
    }
}
