//! Hardware-encoder probing for the transcode step's "hardware accelerator
//! if available, CPU fallback otherwise" policy. Probes are best-effort:
//! a missing tool or an unrecognized GPU just yields an empty result, never
//! an error.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEncoderKind {
    Nvenc,
    Qsv,
    Vaapi,
}

impl HwEncoderKind {
    /// The codec tag this runtime groups under (see `Worker::supports_codec`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nvenc => "nvenc",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
        }
    }

    /// ffmpeg `-hwaccel` argument for this encoder family.
    pub fn ffmpeg_hwaccel(&self) -> &'static str {
        match self {
            Self::Nvenc => "cuda",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
        }
    }
}

/// Probes the host for usable hardware encoders and returns their
/// capability tags, ready to seed `WorkerCapabilities.hw_encoders`.
pub async fn detect_hw_encoders() -> Vec<String> {
    let mut found = Vec::new();

    if probe_nvidia().await {
        found.push(HwEncoderKind::Nvenc.as_str().to_string());
    }
    if probe_vaapi().await {
        found.push(HwEncoderKind::Vaapi.as_str().to_string());
    }
    if probe_qsv().await {
        found.push(HwEncoderKind::Qsv.as_str().to_string());
    }

    found
}

async fn probe_nvidia() -> bool {
    run_probe(
        "nvidia-smi",
        &["--query-gpu=name", "--format=csv,noheader"],
    )
    .await
    .map(|out| !out.trim().is_empty())
    .unwrap_or(false)
}

async fn probe_vaapi() -> bool {
    // `/dev/dri/renderD128` is the conventional VAAPI render node on Linux
    // hosts; its presence is a cheap, dependency-free signal.
    tokio::fs::metadata("/dev/dri/renderD128").await.is_ok()
}

async fn probe_qsv() -> bool {
    run_probe("vainfo", &[])
        .await
        .map(|out| out.to_lowercase().contains("intel"))
        .unwrap_or(false)
}

async fn run_probe(program: &str, args: &[&str]) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::null());

    let child = cmd.spawn().ok()?;
    let output = timeout(PROBE_TIMEOUT, child.wait_with_output()).await.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hw_encoder_tags_round_trip() {
        assert_eq!(HwEncoderKind::Nvenc.as_str(), "nvenc");
        assert_eq!(HwEncoderKind::Nvenc.ffmpeg_hwaccel(), "cuda");
        assert_eq!(HwEncoderKind::Vaapi.ffmpeg_hwaccel(), "vaapi");
    }

    #[tokio::test]
    async fn missing_probe_tool_is_not_an_error() {
        // the probe functions never panic or propagate errors when the
        // underlying CLI tool is absent from the sandbox running the tests
        assert!(!run_probe("definitely-not-a-real-binary", &[]).await.is_some());
    }
}
