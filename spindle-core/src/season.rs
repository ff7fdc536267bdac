//! Season continuation editing paths: accept, edit
//! season/starting-episode, edit individual title, reject.

use spindle_model::{Disc, MediaType, PreviewStatus, TvSeason};

use crate::error::PreviewError;
use crate::metadata::TvMetadataProvider;
use crate::preview::{episode_matcher, filename};
use crate::store::Store;

/// A single-title edit applied verbatim at approval time.
#[derive(Debug, Clone, Default)]
pub struct TitleEdit {
    pub title_index: u32,
    pub proposed_filename: Option<String>,
    pub proposed_path: Option<String>,
    pub episode_number: Option<u32>,
    pub episode_title: Option<String>,
    pub is_extra: Option<bool>,
    pub selected: Option<bool>,
}

pub fn apply_title_edits(disc: &mut Disc, edits: &[TitleEdit]) {
    for edit in edits {
        let Some(title) = disc.titles.iter_mut().find(|t| t.index == edit.title_index) else {
            continue;
        };
        if let Some(is_extra) = edit.is_extra {
            title.is_extra = is_extra;
        }
        if let Some(selected) = edit.selected {
            title.selected = selected;
        }
        if let (Some(num), Some(name)) = (edit.episode_number, &edit.episode_title) {
            title.set_episode(disc.media_type, num, name.clone());
        } else if edit.is_extra == Some(true) {
            title.clear_episode();
        }
        if edit.proposed_filename.is_some() {
            title.proposed_filename = edit.proposed_filename.clone();
        }
        if edit.proposed_path.is_some() {
            title.proposed_path = edit.proposed_path.clone();
        }
    }
}

/// Operator changed the season number or the starting episode: re-fetches
/// episodes if the season changed and re-runs the matcher and filename
/// synthesis.
pub async fn update_season<S: Store + ?Sized>(
    disc: &mut Disc,
    store: &S,
    tv_provider: &dyn TvMetadataProvider,
    new_season_number: u32,
    new_starting_episode: u32,
) -> Result<(), PreviewError> {
    let show_name = disc.tv.show_name.clone().unwrap_or_else(|| disc.name.clone());
    let season_changed = disc.tv.season_number != Some(new_season_number);
    disc.tv.season_number = Some(new_season_number);
    disc.tv.starting_episode_number = Some(new_starting_episode);

    let season_id = TvSeason::season_id_for(&show_name, new_season_number);
    let mut season = store.get_season(&season_id).await.map_err(PreviewError::from)?.unwrap_or_else(|| TvSeason::new(show_name.clone(), new_season_number));

    if season_changed || season.episodes.is_empty() {
        if let Some(series_id) = &disc.tv.series_external_id {
            season.episodes = tv_provider
                .fetch_season_episodes(series_id, new_season_number)
                .await
                .map_err(|e| PreviewError::Metadata(e.to_string()))?;
        }
    }

    let assigned_through = episode_matcher::match_episodes(&mut disc.titles, &mut season, new_starting_episode);
    // this is the one path allowed to move the watermark backwards: an
    // operator correction re-runs the matcher for a single disc, and the
    // corrected run's own high point replaces whatever a prior, superseded
    // run left behind.
    season.set_last_episode_assigned(assigned_through);
    season.record_disc(disc.id, disc.name.clone());
    store.upsert_season(season).await.map_err(PreviewError::from)?;

    for title in disc.titles.iter_mut() {
        if disc.media_type != MediaType::TvShow {
            continue;
        }
        let path = if title.is_extra {
            filename::tv_extra_path(&show_name, new_season_number, &title.name)
        } else {
            let ep_title = title.episode_title.clone().unwrap_or_else(|| title.name.clone());
            filename::tv_main_path(&show_name, new_season_number, title.episode_number.unwrap_or(0), &ep_title)
        };
        if let Ok(path) = path {
            title.proposed_filename = path.rsplit('/').next().map(|s| s.to_string());
            title.proposed_path = Some(path);
        }
    }

    Ok(())
}

/// Rejects a disc's preview; all future rip requests against it must fail.
pub fn reject(disc: &mut Disc) -> Result<(), spindle_model::ModelError> {
    disc.reject_preview()
}

pub fn approve(disc: &mut Disc, edits: &[TitleEdit]) -> Result<(), spindle_model::ModelError> {
    apply_title_edits(disc, edits);
    disc.approve_preview()
}

pub fn is_rejected(disc: &Disc) -> bool {
    disc.preview_status == PreviewStatus::Rejected
}

impl From<spindle_contracts::discs::TitleEditInput> for TitleEdit {
    fn from(input: spindle_contracts::discs::TitleEditInput) -> Self {
        Self {
            title_index: input.title_index,
            proposed_filename: input.proposed_filename,
            proposed_path: input.proposed_path,
            episode_number: input.episode_number,
            episode_title: input.episode_title,
            is_extra: input.is_extra,
            selected: input.selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_model::{DiscType, Title};
    use uuid::Uuid;

    use crate::metadata::NullTvProvider;
    use crate::store::memory::MemoryStore;

    fn disc_with_titles(n: usize) -> Disc {
        let mut disc = Disc::new(Uuid::new_v4(), "agent-1", "/dev/sr0", "Some.Show.S03", DiscType::Dvd);
        disc.media_type = MediaType::TvShow;
        disc.tv.show_name = Some("Some Show".into());
        disc.titles = (0..n as u32).map(|i| Title::new(i, format!("title_{i}"), 20 * 60, 0)).collect();
        disc
    }

    #[tokio::test]
    async fn update_season_resets_watermark_when_the_corrected_run_assigns_fewer_episodes() {
        let store = MemoryStore::new();
        let provider = NullTvProvider;
        let mut disc = disc_with_titles(5);

        // first pass assigns episodes 4..=8, matching the later spurious run
        update_season(&mut disc, &store, &provider, 3, 4).await.unwrap();
        assert_eq!(disc.titles[4].episode_number, Some(8));

        // a second, spurious re-insertion pushes the season watermark to 13
        let season_id = TvSeason::season_id_for("Some Show", 3);
        let mut season = store.get_season(&season_id).await.unwrap().unwrap();
        season.set_last_episode_assigned(13);
        store.upsert_season(season).await.unwrap();

        // operator corrects this disc back to starting episode 4: the
        // watermark must return to this disc's own outcome (8), not stay at 13
        update_season(&mut disc, &store, &provider, 3, 4).await.unwrap();
        let season = store.get_season(&season_id).await.unwrap().unwrap();
        assert_eq!(season.last_episode_assigned, 8);
    }
}
