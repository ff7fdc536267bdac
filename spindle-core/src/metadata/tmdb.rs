//! TMDB-backed TV series/episode provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tmdb_api::client::Client;
use tmdb_api::prelude::Command;
use tmdb_api::tvshow::search::TVShowSearch;
use tmdb_api::tvshow::season::details::TVSeasonDetails;

use spindle_model::TvEpisode;

use super::{TvMetadataProvider, TvSeriesMatch};

pub struct TmdbProvider {
    client: Client,
    season_cache: DashMap<(String, u32), Vec<TvEpisode>>,
}

impl TmdbProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(api_key.into()),
            season_cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl TvMetadataProvider for TmdbProvider {
    async fn find_series(&self, name: &str) -> anyhow::Result<Option<TvSeriesMatch>> {
        let search = TVShowSearch::new(name.to_string());
        let result = search.execute(&self.client).await?;
        Ok(result.results.into_iter().next().map(|show| TvSeriesMatch {
            external_id: show.inner.id.to_string(),
            name: show.inner.name,
        }))
    }

    async fn fetch_season_episodes(&self, series_external_id: &str, season_number: u32) -> anyhow::Result<Vec<TvEpisode>> {
        if let Some(cached) = self.season_cache.get(&(series_external_id.to_string(), season_number)) {
            return Ok(cached.clone());
        }
        let series_id: u64 = series_external_id.parse()?;
        let details = TVSeasonDetails::new(series_id, season_number as u64).execute(&self.client).await?;
        let episodes: Vec<TvEpisode> = details
            .episodes
            .into_iter()
            .map(|ep| TvEpisode {
                episode_number: ep.episode_number as u32,
                name: ep.name,
                season_number,
                runtime_minutes: ep.runtime.map(|r| r as u32),
                overview: Some(ep.overview).filter(|s| !s.is_empty()),
            })
            .collect();
        self.season_cache.insert((series_external_id.to_string(), season_number), episodes.clone());
        Ok(episodes)
    }
}

/// Default lookup timeout for a single provider request.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

pub type SharedTmdbProvider = Arc<TmdbProvider>;
