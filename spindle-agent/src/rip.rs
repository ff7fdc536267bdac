//! Single rip job execution. The job runner enforces the
//! single-flight-per-agent invariant before calling into this module.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use spindle_contracts::subprocess::RipperLine;
use spindle_runtime::subprocess::{parse_ripper_line, run_supervised, LineKind, ProgressSink, ThresholdGate};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{AgentError, Result};
use crate::makemkv::MakeMkv;

pub struct RipOutcome {
    pub output_file: PathBuf,
}

/// Launches the ripping subprocess for one title and waits for completion,
/// streaming progress through `sink` gated to 10% steps.
pub async fn rip_title(
    makemkv: &MakeMkv,
    drive: &str,
    title_index: u32,
    output_dir: &Path,
    sink: Arc<dyn ProgressSink>,
) -> Result<RipOutcome> {
    tokio::fs::create_dir_all(output_dir).await?;
    let disc_index = makemkv.disc_index_for_drive(drive).await?;

    let mut cmd = Command::new(makemkv.executable());
    cmd.args([
        "-r",
        "--noscan",
        "--progress=-same",
        "mkv",
        &format!("disc:{disc_index}"),
        &title_index.to_string(),
    ]);
    cmd.arg(output_dir);

    info!(drive, title_index, "starting rip");

    let gate = Mutex::new(ThresholdGate::new(10.0));
    let gated_sink = GatedRipSink { inner: sink, gate };

    let outcome = run_supervised(cmd, makemkv.process_limits(), &gated_sink, |line| match parse_ripper_line(line) {
        RipperLine::Progress { current, total, max } => {
            Some(LineKind::Rip(spindle_contracts::subprocess::RipProgress { current, total, max }))
        }
        _ => None,
    })
    .await
    .map_err(AgentError::from)?;

    if outcome.exit_code != 0 {
        return Err(AgentError::Other(anyhow::anyhow!(
            "ripper exited with {}: {}",
            outcome.exit_code,
            outcome.tail.join("\n")
        )));
    }

    let output_file = newest_mkv(output_dir).await?.ok_or_else(|| AgentError::NoOutputFile(output_dir.display().to_string()))?;
    Ok(RipOutcome { output_file })
}

async fn newest_mkv(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("mkv") {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Wraps a `ProgressSink`, only forwarding rip progress once it crosses a
/// 10-point threshold since the last report.
struct GatedRipSink {
    inner: Arc<dyn ProgressSink>,
    gate: Mutex<ThresholdGate>,
}

#[async_trait::async_trait]
impl ProgressSink for GatedRipSink {
    async fn report_rip_progress(&self, progress: spindle_contracts::subprocess::RipProgress) {
        let percent = progress.percent();
        let should_report = self.gate.lock().await.should_report(percent);
        if should_report {
            self.inner.report_rip_progress(progress).await;
        }
    }

    async fn report_transcode_progress(&self, progress: spindle_contracts::subprocess::TranscodeProgress) {
        self.inner.report_transcode_progress(progress).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn newest_mkv_picks_most_recently_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.mkv"), b"a").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        tokio::fs::write(dir.path().join("b.mkv"), b"b").await.unwrap();
        tokio::fs::write(dir.path().join("c.txt"), b"c").await.unwrap();

        let newest = newest_mkv(dir.path()).await.unwrap().unwrap();
        assert_eq!(newest.file_name().unwrap(), "b.mkv");
    }
}
