//! Cross-disc season continuation state.

use uuid::Uuid;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TvEpisode {
    pub episode_number: u32,
    pub name: String,
    pub season_number: u32,
    pub runtime_minutes: Option<u32>,
    pub overview: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TvSeason {
    /// `"<normalized_show>:s<n>"` — the single source of truth for episode
    /// numbering across discs belonging to the same season.
    pub season_id: String,
    pub show_name: String,
    pub season_number: u32,
    pub series_external_id: Option<String>,
    pub episodes: Vec<TvEpisode>,
    pub last_episode_assigned: u32,
    pub disc_ids: Vec<Uuid>,
    pub last_disc_name: Option<String>,
}

impl TvSeason {
    pub fn season_id_for(show_name: &str, season_number: u32) -> String {
        format!("{}:s{}", normalize_show_name(show_name), season_number)
    }

    pub fn new(show_name: impl Into<String>, season_number: u32) -> Self {
        let show_name = show_name.into();
        let season_id = Self::season_id_for(&show_name, season_number);
        Self {
            season_id,
            show_name,
            season_number,
            series_external_id: None,
            episodes: Vec::new(),
            last_episode_assigned: 0,
            disc_ids: Vec::new(),
            last_disc_name: None,
        }
    }

    /// Records a disc arrival. Returns the episode number a disc whose
    /// `starting_episode_number` is unset should begin at when this disc's
    /// name repeats the last one seen.
    pub fn starting_episode_for_reinsertion(&self, disc_name: &str) -> Option<u32> {
        if self.last_disc_name.as_deref() == Some(disc_name) {
            Some(self.last_episode_assigned + 1)
        } else {
            None
        }
    }

    /// `last_episode_assigned` only moves forward through normal episode
    /// assignment; operator edits bypass this setter entirely.
    pub fn advance_last_episode(&mut self, assigned_through: u32) {
        if assigned_through > self.last_episode_assigned {
            self.last_episode_assigned = assigned_through;
        }
    }

    /// Resets the watermark to exactly the given value. Unlike
    /// `advance_last_episode`, this can move it backwards — used when an
    /// operator corrects a season/starting-episode and the re-run's
    /// assignment no longer reaches as far as a prior, now-superseded run.
    pub fn set_last_episode_assigned(&mut self, assigned_through: u32) {
        self.last_episode_assigned = assigned_through;
    }

    pub fn record_disc(&mut self, disc_id: Uuid, disc_name: impl Into<String>) {
        if !self.disc_ids.contains(&disc_id) {
            self.disc_ids.push(disc_id);
        }
        self.last_disc_name = Some(disc_name.into());
    }

    pub fn episode(&self, number: u32) -> Option<&TvEpisode> {
        self.episodes.iter().find(|e| e.episode_number == number)
    }
}

/// Lowercases and strips punctuation so `"The Office"`/`"the-office"` collide
/// on the same season id.
pub fn normalize_show_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
