//! The preview pipeline orchestrator: disc metadata matching, title
//! classification, and filename proposal, run synchronously on every disc
//! detection and re-detection.

use spindle_model::{Disc, MediaType, PreviewStatus, TvSeason};

use crate::error::PreviewError;
use crate::metadata::{MovieMetadataProvider, TvMetadataProvider};
use crate::preview::{episode_matcher, extras_filter, filename, name_pattern, title_heuristic};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub min_duration_secs: u64,
    pub variance_threshold: f64,
    pub ambiguous_search_enabled: bool,
    pub auto_approve: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: extras_filter::DEFAULT_MIN_DURATION_SECS,
            variance_threshold: extras_filter::DEFAULT_VARIANCE_THRESHOLD,
            ambiguous_search_enabled: false,
            auto_approve: false,
        }
    }
}

pub struct PreviewPipeline<'a, S: Store + ?Sized> {
    store: &'a S,
    tv_provider: &'a dyn TvMetadataProvider,
    movie_provider: &'a dyn MovieMetadataProvider,
    config: PreviewConfig,
}

impl<'a, S: Store + ?Sized> PreviewPipeline<'a, S> {
    pub fn new(store: &'a S, tv_provider: &'a dyn TvMetadataProvider, movie_provider: &'a dyn MovieMetadataProvider, config: PreviewConfig) -> Self {
        Self {
            store,
            tv_provider,
            movie_provider,
            config,
        }
    }

    pub async fn run(&self, disc: &mut Disc) -> Result<(), PreviewError> {
        if disc.titles.is_empty() {
            return Err(PreviewError::NoTitles);
        }

        // Stage 1 + 2.
        let duration_verdict = title_heuristic::classify_by_duration(&disc.titles);
        let name_verdict = name_pattern::detect_from_name(&disc.name, self.config.ambiguous_search_enabled);

        // Stage 3: reconciliation.
        let is_tv = if !name_verdict.is_tv && duration_verdict.media_type == MediaType::TvShow && duration_verdict.confidence >= 0.7 {
            true
        } else if name_verdict.is_tv && duration_verdict.media_type == MediaType::Movie && duration_verdict.confidence >= 0.8 {
            false
        } else {
            name_verdict.is_tv
        };

        disc.media_type = if is_tv {
            MediaType::TvShow
        } else if duration_verdict.media_type == MediaType::Movie {
            MediaType::Movie
        } else {
            duration_verdict.media_type
        };

        // Stage 4: metadata.
        if is_tv {
            self.resolve_tv_metadata(disc, &name_verdict).await?;
        } else if disc.media_type == MediaType::Movie {
            self.resolve_movie_metadata(disc).await?;
        }

        // Stage 5: extras filter.
        extras_filter::mark_extras(
            &mut disc.titles,
            &extras_filter::ExtrasFilterConfig {
                min_duration_secs: self.config.min_duration_secs,
                variance_threshold: self.config.variance_threshold,
            },
        );

        // Stage 6: episode matching (TV only).
        if is_tv {
            self.match_episodes(disc).await?;
        }

        // Stage 7: filename synthesis.
        self.synthesize_filenames(disc)?;

        // Stage 8: finalize.
        disc.preview_status = if self.config.auto_approve {
            PreviewStatus::Approved
        } else {
            PreviewStatus::Pending
        };
        self.store.replace_disc(disc.clone()).await.map_err(PreviewError::from)?;
        Ok(())
    }

    async fn resolve_tv_metadata(&self, disc: &mut Disc, name_verdict: &name_pattern::NamePatternResult) -> Result<(), PreviewError> {
        let show_name = disc.tv.show_name.clone().or_else(|| name_verdict.show_name.clone()).unwrap_or_else(|| disc.name.clone());
        disc.tv.show_name = Some(show_name.clone());
        disc.tv.season_number = disc.tv.season_number.or(name_verdict.season_number).or(Some(1));

        if disc.tv.series_external_id.is_none() {
            if let Some(series) = self.tv_provider.find_series(&show_name).await.map_err(|e| PreviewError::Metadata(e.to_string()))? {
                disc.tv.series_external_id = Some(series.external_id);
            }
        }
        Ok(())
    }

    async fn resolve_movie_metadata(&self, disc: &mut Disc) -> Result<(), PreviewError> {
        let title = disc.movie.title.clone().unwrap_or_else(|| disc.name.clone());
        let year = disc.movie.year.or_else(|| name_pattern::parse_year(&disc.name));
        if let Some(found) = self
            .movie_provider
            .find_movie(&title, year)
            .await
            .map_err(|e| PreviewError::Metadata(e.to_string()))?
        {
            disc.movie.title = Some(found.title);
            disc.movie.year = found.year.or(year);
            disc.movie.imdb_id = found.imdb_id;
            disc.movie.confidence = found.confidence;
        } else {
            disc.movie.title = Some(title);
            disc.movie.year = year;
        }
        Ok(())
    }

    async fn match_episodes(&self, disc: &mut Disc) -> Result<(), PreviewError> {
        let show_name = disc.tv.show_name.clone().unwrap_or_else(|| disc.name.clone());
        let season_number = disc.tv.season_number.unwrap_or(1);
        let season_id = TvSeason::season_id_for(&show_name, season_number);

        let mut season = match self.store.get_season(&season_id).await.map_err(PreviewError::from)? {
            Some(season) => season,
            None => {
                let mut season = TvSeason::new(show_name.clone(), season_number);
                season.series_external_id = disc.tv.series_external_id.clone();
                if let Some(series_id) = &season.series_external_id {
                    season.episodes = self
                        .tv_provider
                        .fetch_season_episodes(series_id, season_number)
                        .await
                        .map_err(|e| PreviewError::Metadata(e.to_string()))?;
                }
                season
            }
        };
        disc.tv.season_id = Some(season_id);

        let starting_episode = disc
            .tv
            .starting_episode_number
            .or_else(|| season.starting_episode_for_reinsertion(&disc.name))
            .unwrap_or(season.last_episode_assigned + 1);
        disc.tv.starting_episode_number = Some(starting_episode);

        episode_matcher::match_episodes(&mut disc.titles, &mut season, starting_episode);
        season.record_disc(disc.id, disc.name.clone());
        self.store.upsert_season(season).await.map_err(PreviewError::from)?;
        Ok(())
    }

    fn synthesize_filenames(&self, disc: &mut Disc) -> Result<(), PreviewError> {
        let show_name = disc.tv.show_name.clone();
        let season_number = disc.tv.season_number.unwrap_or(1);
        let movie_title = disc.movie.title.clone();
        let movie_year = disc.movie.year;

        for title in disc.titles.iter_mut() {
            let path = match (disc.media_type, title.is_extra) {
                (MediaType::TvShow, false) => {
                    let show = show_name.as_deref().unwrap_or(&disc.name);
                    let ep_num = title.episode_number.unwrap_or(0);
                    let ep_title = title.episode_title.clone().unwrap_or_else(|| title.name.clone());
                    filename::tv_main_path(show, season_number, ep_num, &ep_title)
                }
                (MediaType::TvShow, true) => {
                    let show = show_name.as_deref().unwrap_or(&disc.name);
                    filename::tv_extra_path(show, season_number, &title.name)
                }
                (MediaType::Movie, false) => {
                    let movie = movie_title.as_deref().unwrap_or(&disc.name);
                    filename::movie_main_path(movie, movie_year)
                }
                (MediaType::Movie, true) => {
                    let movie = movie_title.as_deref().unwrap_or(&disc.name);
                    filename::movie_extra_path(movie, movie_year, &title.name)
                }
                (MediaType::Unknown, _) => continue,
            };
            if let Ok(path) = path {
                title.proposed_path = Some(path.clone());
                title.proposed_filename = path.rsplit('/').next().map(|s| s.to_string());
            }
        }
        Ok(())
    }
}
