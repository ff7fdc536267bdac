//! Disc and Title entities produced by detection and refined by the preview
//! pipeline.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ModelError;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiscType {
    Dvd,
    BluRay,
    Unknown,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiscStatus {
    Detected,
    Ripping,
    Completed,
    Ejected,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaType {
    Movie,
    TvShow,
    Unknown,
}

/// Preview approval gate. Transitions only `pending -> approved|rejected`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PreviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// Qualitative confidence band used for episode matching and operator display.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Confidence {
    High,
    Medium,
    Low,
    VeryLow,
}

impl Confidence {
    /// Banding thresholds: 0.95 / 0.70 / 0.40 / 0.30.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Confidence::High
        } else if score >= 0.70 {
            Confidence::Medium
        } else if score >= 0.40 {
            Confidence::Low
        } else {
            Confidence::VeryLow
        }
    }

    pub fn score(self) -> f64 {
        match self {
            Confidence::High => 0.95,
            Confidence::Medium => 0.70,
            Confidence::Low => 0.40,
            Confidence::VeryLow => 0.30,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TvInfo {
    pub show_name: Option<String>,
    pub season_number: Option<u32>,
    pub season_id: Option<String>,
    pub series_external_id: Option<String>,
    pub starting_episode_number: Option<u32>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieInfo {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub confidence: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub index: u32,
    pub name: String,
    pub duration_seconds: u64,
    pub size_bytes: u64,
    pub chapters: u32,
    pub selected: bool,
    pub is_extra: bool,
    pub proposed_filename: Option<String>,
    pub proposed_path: Option<String>,
    pub episode_number: Option<u32>,
    pub episode_title: Option<String>,
    pub confidence: f64,
    pub thumbnails: Vec<String>,
    pub thumbnail_timestamps: Vec<u64>,
}

impl Title {
    pub fn new(index: u32, name: impl Into<String>, duration_seconds: u64, size_bytes: u64) -> Self {
        Self {
            index,
            name: name.into(),
            duration_seconds,
            size_bytes,
            chapters: 0,
            selected: false,
            is_extra: false,
            proposed_filename: None,
            proposed_path: None,
            episode_number: None,
            episode_title: None,
            confidence: 0.0,
            thumbnails: Vec::new(),
            thumbnail_timestamps: Vec::new(),
        }
    }

    /// Enforces the invariant: episode fields only make sense for main TV
    /// titles. Clears them otherwise rather than trusting the caller.
    pub fn set_episode(&mut self, media_type: MediaType, episode_number: u32, episode_title: impl Into<String>) {
        if media_type == MediaType::TvShow && !self.is_extra {
            self.episode_number = Some(episode_number);
            self.episode_title = Some(episode_title.into());
        }
    }

    pub fn clear_episode(&mut self) {
        self.episode_number = None;
        self.episode_title = None;
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Disc {
    pub id: Uuid,
    pub agent_id: String,
    pub drive: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub disc_type: DiscType,
    pub titles: Vec<Title>,
    pub detected_at: DateTime<Utc>,
    pub status: DiscStatus,
    pub media_type: MediaType,
    pub preview_status: PreviewStatus,
    pub tv: TvInfo,
    pub movie: MovieInfo,
}

impl Disc {
    pub fn new(id: Uuid, agent_id: impl Into<String>, drive: impl Into<String>, name: impl Into<String>, disc_type: DiscType) -> Self {
        Self {
            id,
            agent_id: agent_id.into(),
            drive: drive.into(),
            name: name.into(),
            disc_type,
            titles: Vec::new(),
            detected_at: Utc::now(),
            status: DiscStatus::Detected,
            media_type: MediaType::Unknown,
            preview_status: PreviewStatus::Pending,
            tv: TvInfo::default(),
            movie: MovieInfo::default(),
        }
    }

    /// Preview status only ever moves `pending -> approved|rejected`.
    pub fn approve_preview(&mut self) -> Result<(), ModelError> {
        if self.preview_status != PreviewStatus::Pending {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.preview_status),
                to: "approved".into(),
            });
        }
        self.preview_status = PreviewStatus::Approved;
        Ok(())
    }

    pub fn reject_preview(&mut self) -> Result<(), ModelError> {
        if self.preview_status != PreviewStatus::Pending {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.preview_status),
                to: "rejected".into(),
            });
        }
        self.preview_status = PreviewStatus::Rejected;
        Ok(())
    }

    pub fn can_rip(&self) -> bool {
        self.preview_status == PreviewStatus::Approved && self.status != DiscStatus::Ejected
    }

    pub fn main_titles(&self) -> impl Iterator<Item = &Title> {
        self.titles.iter().filter(|t| !t.is_extra)
    }
}

/// Sanitizes a proposed filename component: strips the Windows-reserved
/// characters and collapses runs of whitespace.
pub fn sanitize_filename_component(raw: &str) -> Result<String, ModelError> {
    let stripped: String = raw.chars().filter(|c| !"<>:\"/\\|?*".contains(*c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim().to_string();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyFilename);
    }
    Ok(trimmed)
}
