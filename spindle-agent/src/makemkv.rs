//! Wraps the ripping tool's "robot mode" CLI: drive-index resolution, disc
//! analysis, and title extraction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use spindle_contracts::subprocess::RipperLine;
use spindle_runtime::subprocess::{parse_ripper_line, ProcessLimits};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{AgentError, Result};

const DISC_INDEX_TIMEOUT: Duration = Duration::from_secs(30);
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(300);
pub const ANALYZE_RETRIES: u32 = 3;
pub const ANALYZE_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DiscTitle {
    pub index: u32,
    pub name: String,
    pub duration_seconds: u64,
    pub size_bytes: u64,
    pub chapters: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DiscAnalysis {
    pub disc_name: String,
    pub titles: Vec<DiscTitle>,
}

pub struct MakeMkv {
    executable: PathBuf,
}

impl MakeMkv {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    /// Resolves a drive letter to the ripping tool's numeric disc index by
    /// querying an invalid index, which triggers a drive listing.
    pub async fn disc_index_for_drive(&self, drive: &str) -> Result<u32> {
        let output = tokio::time::timeout(DISC_INDEX_TIMEOUT, self.run_info("disc:9999")).await;
        let stdout = match output {
            Ok(Ok(stdout)) => stdout,
            _ => {
                warn!(drive, "disc index probe timed out or failed");
                return Ok(0);
            }
        };

        for line in stdout.lines() {
            if let RipperLine::DriveListing { index, drive_letter } = parse_ripper_line(line) {
                if drive_letter.eq_ignore_ascii_case(drive) {
                    return Ok(index);
                }
            }
        }
        debug!(drive, "drive not found in probe listing, defaulting to index 0");
        Ok(0)
    }

    /// Analyzes a disc, retrying up to `ANALYZE_RETRIES` times with
    /// `ANALYZE_RETRY_DELAY` backoff.
    pub async fn analyze_disc(&self, drive: &str) -> Result<DiscAnalysis> {
        let disc_index = self.disc_index_for_drive(drive).await?;
        let mut last_err = None;

        for attempt in 1..=ANALYZE_RETRIES {
            match tokio::time::timeout(ANALYZE_TIMEOUT, self.run_info(&format!("disc:{disc_index}"))).await {
                Ok(Ok(stdout)) => return Ok(parse_info_output(&stdout)),
                Ok(Err(err)) => {
                    warn!(attempt, drive, error = %err, "disc analysis attempt failed");
                    last_err = Some(err);
                }
                Err(_) => {
                    warn!(attempt, drive, "disc analysis attempt timed out");
                    last_err = Some(AgentError::Other(anyhow::anyhow!("analyze timed out")));
                }
            }
            if attempt < ANALYZE_RETRIES {
                tokio::time::sleep(ANALYZE_RETRY_DELAY).await;
            }
        }
        Err(last_err.expect("at least one attempt ran"))
    }

    async fn run_info(&self, disc_arg: &str) -> Result<String> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["-r", "--noscan", "info", disc_arg]);
        let output = cmd.output().await.map_err(|e| AgentError::Other(e.into()))?;
        if !output.status.success() {
            return Err(AgentError::Other(anyhow::anyhow!(
                "ripper info exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn process_limits(&self) -> ProcessLimits {
        ProcessLimits::rip_defaults()
    }
}

fn parse_info_output(output: &str) -> DiscAnalysis {
    let mut disc_name = String::new();
    let mut titles: std::collections::BTreeMap<u32, DiscTitle> = std::collections::BTreeMap::new();

    for line in output.lines() {
        match parse_ripper_line(line) {
            RipperLine::DiscInfo { code: 2, value, .. } => disc_name = value,
            RipperLine::TitleInfo { title, code, value } => {
                let entry = titles.entry(title).or_insert_with(|| DiscTitle {
                    index: title,
                    name: String::new(),
                    duration_seconds: 0,
                    size_bytes: 0,
                    chapters: 0,
                });
                match code {
                    2 => entry.name = value,
                    9 => entry.duration_seconds = parse_hms(&value),
                    10 => entry.size_bytes = value.parse().unwrap_or(0),
                    8 => entry.chapters = value.parse().unwrap_or(0),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    DiscAnalysis { disc_name, titles: titles.into_values().collect() }
}

fn parse_hms(value: &str) -> u64 {
    let parts: Vec<_> = value.split(':').collect();
    match parts[..] {
        [h, m, s] => {
            let h: u64 = h.parse().unwrap_or(0);
            let m: u64 = m.parse().unwrap_or(0);
            let s: u64 = s.parse().unwrap_or(0);
            h * 3600 + m * 60 + s
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disc_and_title_info() {
        let output = "CINFO:0,2,My Movie\nTINFO:0,2,Main Feature\nTINFO:0,9,1:32:10\nTINFO:0,10,8500000000\nTINFO:0,8,20\n";
        let analysis = parse_info_output(output);
        assert_eq!(analysis.disc_name, "My Movie");
        assert_eq!(analysis.titles.len(), 1);
        let title = &analysis.titles[0];
        assert_eq!(title.name, "Main Feature");
        assert_eq!(title.duration_seconds, 5530);
        assert_eq!(title.size_bytes, 8_500_000_000);
        assert_eq!(title.chapters, 20);
    }

    #[test]
    fn parses_hms_duration() {
        assert_eq!(parse_hms("1:32:10"), 5530);
        assert_eq!(parse_hms("garbage"), 0);
    }
}
