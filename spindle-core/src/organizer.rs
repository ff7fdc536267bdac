//! Library organizer: parses an uploaded filename, resolves the library
//! destination, moves the file atomically, and fires the scan-trigger and
//! notification sinks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::notify::NotificationSink;

/// External media-server scan trigger.
#[async_trait]
pub trait ScanTriggerSink: Send + Sync {
    async fn trigger_scan(&self, subtree: &Path);
}

#[derive(Debug, Default)]
pub struct NullScanTrigger;

#[async_trait]
impl ScanTriggerSink for NullScanTrigger {
    async fn trigger_scan(&self, _subtree: &Path) {}
}

/// Delay between the move completing and the scan trigger firing, giving
/// the external media server's filesystem watcher time to settle.
pub const SCAN_SETTLE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LibraryRoots {
    pub tv_prefix: PathBuf,
    pub movie_prefix: PathBuf,
}

fn tv_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+?) - S(\d{2})E(\d{2}) - .+\.mkv$").unwrap())
}

fn movie_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+) \((\d{4})\)\.mkv$").unwrap())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedUpload {
    Tv { show: String, season: u32 },
    Movie { title: String, year: i32 },
    Unrecognized,
}

/// Re-derives the media type from the filename the agent/worker uploaded,
/// mirroring the proposed-path convention synthesized in the preview
/// pipeline.
pub fn parse_upload_filename(filename: &str) -> ParsedUpload {
    if let Some(caps) = tv_filename_re().captures(filename) {
        return ParsedUpload::Tv {
            show: caps[1].to_string(),
            season: caps[2].parse().unwrap_or(1),
        };
    }
    if let Some(caps) = movie_filename_re().captures(filename) {
        return ParsedUpload::Movie {
            title: caps[1].to_string(),
            year: caps[2].parse().unwrap_or(0),
        };
    }
    ParsedUpload::Unrecognized
}

pub fn resolve_destination(roots: &LibraryRoots, parsed: &ParsedUpload, filename: &str) -> Option<PathBuf> {
    match parsed {
        ParsedUpload::Tv { show, season } => Some(roots.tv_prefix.join(show).join(format!("Season {season:02}")).join(filename)),
        ParsedUpload::Movie { title, year } => Some(roots.movie_prefix.join(format!("{title} ({year})")).join(filename)),
        ParsedUpload::Unrecognized => None,
    }
}

/// Moves `source` to `destination` atomically (rename within the same
/// filesystem; the library root is expected to be colocated with the
/// upload staging area). Leaves the upload in place on failure.
pub async fn organize(
    source: &Path,
    roots: &LibraryRoots,
    notifier: &dyn NotificationSink,
    scan_trigger: &dyn ScanTriggerSink,
) -> anyhow::Result<Option<PathBuf>> {
    let filename = source.file_name().and_then(|f| f.to_str()).ok_or_else(|| anyhow::anyhow!("upload path has no filename"))?;
    let parsed = parse_upload_filename(filename);
    let Some(destination) = resolve_destination(roots, &parsed, filename) else {
        notifier.notify(&format!("could not organize `{filename}`: unrecognized filename pattern")).await;
        return Ok(None);
    };

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(source, &destination).await?;

    tokio::time::sleep(SCAN_SETTLE_DELAY).await;
    if let Some(parent) = destination.parent() {
        scan_trigger.trigger_scan(parent).await;
    }
    notifier.notify(&format!("organized `{filename}` into the library")).await;

    Ok(Some(destination))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tv_filename() {
        let parsed = parse_upload_filename("The Wire - S01E01 - The Target.mkv");
        assert_eq!(parsed, ParsedUpload::Tv { show: "The Wire".into(), season: 1 });
    }

    #[test]
    fn parses_movie_filename() {
        let parsed = parse_upload_filename("Heat (1995).mkv");
        assert_eq!(parsed, ParsedUpload::Movie { title: "Heat".into(), year: 1995 });
    }

    #[test]
    fn unrecognized_filename_yields_none_destination() {
        let roots = LibraryRoots {
            tv_prefix: PathBuf::from("/library/tv"),
            movie_prefix: PathBuf::from("/library/movies"),
        };
        let parsed = parse_upload_filename("random_output.mkv");
        assert!(resolve_destination(&roots, &parsed, "random_output.mkv").is_none());
    }

    #[test]
    fn resolves_tv_destination_under_season_folder() {
        let roots = LibraryRoots {
            tv_prefix: PathBuf::from("/library/tv"),
            movie_prefix: PathBuf::from("/library/movies"),
        };
        let parsed = ParsedUpload::Tv { show: "The Wire".into(), season: 1 };
        let dest = resolve_destination(&roots, &parsed, "The Wire - S01E01 - The Target.mkv").unwrap();
        assert_eq!(dest, PathBuf::from("/library/tv/The Wire/Season 01/The Wire - S01E01 - The Target.mkv"));
    }
}
