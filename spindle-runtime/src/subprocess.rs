//! Line-buffered reading and classification of the ripping and transcoding
//! tools' stdout, plus the bounded-lifetime process supervisor both the rip
//! and transcode executors share: every spawn carries a stall detector and a
//! hard timeout, and the process group is always killed on the way out.

use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use spindle_contracts::subprocess::{RipProgress, RipperLine, TranscodeProgress};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};

/// Parses one line of ripping-tool "robot mode" stdout.
pub fn parse_ripper_line(line: &str) -> RipperLine {
    if let Some(rest) = line.strip_prefix("CINFO:") {
        if let Some((index, code, value)) = split3(rest) {
            if let (Ok(index), Ok(code)) = (index.parse(), code.parse()) {
                return RipperLine::DiscInfo { index, code, value };
            }
        }
    } else if let Some(rest) = line.strip_prefix("TINFO:") {
        if let Some((title, code, value)) = split3(rest) {
            if let (Ok(title), Ok(code)) = (title.parse(), code.parse()) {
                return RipperLine::TitleInfo { title, code, value };
            }
        }
    } else if let Some(rest) = line.strip_prefix("PRGV:") {
        let parts: Vec<_> = rest.split(',').collect();
        if let [cur, total, max] = parts[..] {
            if let (Ok(current), Ok(total), Ok(max)) = (cur.parse(), total.parse(), max.parse()) {
                return RipperLine::Progress { current, total, max };
            }
        }
    } else if let Some(rest) = line.strip_prefix("MSG:") {
        return RipperLine::Message(rest.to_string());
    } else if let Some(listing) = parse_drive_listing(line) {
        return listing;
    }
    RipperLine::Unrecognized(line.to_string())
}

fn split3(rest: &str) -> Option<(&str, &str, String)> {
    let mut parts = rest.splitn(3, ',');
    let a = parts.next()?;
    let b = parts.next()?;
    let c = parts.next()?;
    Some((a, b, c.to_string()))
}

fn drive_listing_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(\d+)\s+([A-Z]:)\\?\s*$").expect("valid regex"))
}

/// A probe query against an invalid title index returns a drive listing
/// used to resolve drive-letter -> index.
fn parse_drive_listing(line: &str) -> Option<RipperLine> {
    let caps = drive_listing_regex().captures(line)?;
    let index = caps.get(1)?.as_str().parse().ok()?;
    let drive_letter = caps.get(2)?.as_str().to_string();
    Some(RipperLine::DriveListing { index, drive_letter })
}

fn transcode_progress_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Encoding:.*?([0-9]+(?:\.[0-9]+)?)\s*%").expect("valid regex"))
}

/// Parses `"Encoding: ... 45.67 %"` style transcoding-tool progress lines.
pub fn parse_transcode_progress(line: &str) -> Option<TranscodeProgress> {
    let caps = transcode_progress_regex().captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(TranscodeProgress { percent: percent.clamp(0.0, 100.0) })
}

/// Destination for progress updates observed while a subprocess runs.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report_rip_progress(&self, progress: RipProgress);
    async fn report_transcode_progress(&self, progress: TranscodeProgress);
}

pub struct NullProgressSink;

#[async_trait::async_trait]
impl ProgressSink for NullProgressSink {
    async fn report_rip_progress(&self, _progress: RipProgress) {}
    async fn report_transcode_progress(&self, _progress: TranscodeProgress) {}
}

/// Bounds how long a process may run and how long it may go without
/// producing output. Every spawned subprocess's lifecycle stays bounded,
/// regardless of what the tool itself does.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLimits {
    pub stall_timeout: Duration,
    pub hard_timeout: Duration,
}

impl ProcessLimits {
    pub fn rip_defaults() -> Self {
        Self { stall_timeout: Duration::from_secs(300), hard_timeout: Duration::from_secs(2 * 60 * 60) }
    }
}

/// Every stdout/stderr line observed by a supervised run, classified as
/// progress (reported to the sink) or passed through to the caller for
/// error-reporting / final-output discovery.
pub struct RunOutcome {
    pub exit_code: i32,
    /// Last N lines of combined output, newest last; used for error reports.
    pub tail: Vec<String>,
}

/// Spawns `cmd`, streams its stdout through `classify`, forwarding parsed
/// progress to `sink`, and enforces `limits`. Kills the process (and, on
/// Unix, its process group) on stall, hard-timeout, or early return.
pub async fn run_supervised<F>(
    mut cmd: Command,
    limits: ProcessLimits,
    sink: &dyn ProgressSink,
    mut classify: F,
) -> Result<RunOutcome>
where
    F: FnMut(&str) -> Option<LineKind> + Send,
{
    cmd.stdout(Stdio::piped()).stderr(Stdio::null());
    let mut child = cmd.spawn().map_err(RuntimeError::Spawn)?;
    let stdout = child.stdout.take().expect("stdout piped");
    let mut lines = BufReader::new(stdout).lines();

    let mut tail: Vec<String> = Vec::new();
    let start = Instant::now();
    let mut last_output = Instant::now();

    loop {
        if start.elapsed() > limits.hard_timeout {
            kill(&mut child).await;
            return Err(RuntimeError::HardTimeout(limits.hard_timeout));
        }

        let remaining_stall = limits.stall_timeout.saturating_sub(last_output.elapsed());
        match timeout(remaining_stall.max(Duration::from_millis(1)), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                last_output = Instant::now();
                push_tail(&mut tail, &line);
                if let Some(kind) = classify(&line) {
                    match kind {
                        LineKind::Rip(progress) => sink.report_rip_progress(progress).await,
                        LineKind::Transcode(progress) => sink.report_transcode_progress(progress).await,
                    }
                } else {
                    debug!(%line, "unclassified subprocess output");
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => {
                warn!(error = %err, "error reading subprocess output");
                break;
            }
            Err(_) => {
                kill(&mut child).await;
                return Err(RuntimeError::Stall(limits.stall_timeout));
            }
        }
    }

    let status = child.wait().await.map_err(RuntimeError::Spawn)?;
    Ok(RunOutcome { exit_code: status.code().unwrap_or(-1), tail })
}

pub enum LineKind {
    Rip(RipProgress),
    Transcode(TranscodeProgress),
}

fn push_tail(tail: &mut Vec<String>, line: &str) {
    const MAX_TAIL: usize = 50;
    tail.push(line.to_string());
    if tail.len() > MAX_TAIL {
        tail.remove(0);
    }
}

async fn kill(child: &mut Child) {
    if let Err(err) = child.kill().await {
        warn!(error = %err, "failed to kill stalled/timed-out subprocess");
    }
}

/// Sends progress updates only when the percentage has advanced at least
/// 10 points since the last report.
pub struct ThresholdGate {
    last_reported: f64,
    step: f64,
}

impl ThresholdGate {
    pub fn new(step: f64) -> Self {
        Self { last_reported: f64::NEG_INFINITY, step }
    }

    pub fn should_report(&mut self, percent: f64) -> bool {
        if percent - self.last_reported >= self.step || percent >= 100.0 {
            self.last_reported = percent;
            true
        } else {
            false
        }
    }
}

/// Drains a progress-line channel in the background, handed to a classifier
/// that decides rip vs transcode framing; used when stdout and stderr must
/// be read concurrently (ripping tools write to stdout, transcoders to
/// stderr in some builds).
pub fn spawn_line_forwarder(mut rx: mpsc::Receiver<String>, sink: std::sync::Arc<dyn ProgressSink>) {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Some(progress) = parse_transcode_progress(&line) {
                sink.report_transcode_progress(progress).await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disc_info_line() {
        let parsed = parse_ripper_line("CINFO:1,2,Spindle Test Disc");
        assert_eq!(parsed, RipperLine::DiscInfo { index: 1, code: 2, value: "Spindle Test Disc".to_string() });
    }

    #[test]
    fn parses_title_info_line() {
        let parsed = parse_ripper_line("TINFO:3,9,2:15:30");
        assert_eq!(parsed, RipperLine::TitleInfo { title: 3, code: 9, value: "2:15:30".to_string() });
    }

    #[test]
    fn parses_progress_line() {
        let parsed = parse_ripper_line("PRGV:450,900,900");
        assert_eq!(parsed, RipperLine::Progress { current: 450, total: 900, max: 900 });
    }

    #[test]
    fn parses_message_line() {
        let parsed = parse_ripper_line("MSG:Saving 1 Title(s)");
        assert_eq!(parsed, RipperLine::Message("Saving 1 Title(s)".to_string()));
    }

    #[test]
    fn parses_drive_listing_line() {
        let parsed = parse_ripper_line("1 D:\\");
        assert_eq!(parsed, RipperLine::DriveListing { index: 1, drive_letter: "D:".to_string() });
    }

    #[test]
    fn unrecognized_line_passes_through() {
        let parsed = parse_ripper_line("garbage output");
        assert_eq!(parsed, RipperLine::Unrecognized("garbage output".to_string()));
    }

    #[test]
    fn parses_transcode_progress() {
        let progress = parse_transcode_progress("Encoding: frame=120 fps=30 45.67 %").unwrap();
        assert!((progress.percent - 45.67).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_gate_only_reports_on_ten_point_steps() {
        let mut gate = ThresholdGate::new(10.0);
        assert!(gate.should_report(0.0));
        assert!(!gate.should_report(5.0));
        assert!(gate.should_report(11.0));
        assert!(gate.should_report(100.0));
    }
}
