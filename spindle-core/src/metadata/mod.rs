//! Metadata lookups for the preview pipeline's step 4: a TV
//! series/episode provider and a movie provider, each a typed query
//! interface with a cache in front of the real API.

pub mod omdb;
pub mod tmdb;

use async_trait::async_trait;

use spindle_model::TvEpisode;

#[derive(Debug, Clone)]
pub struct TvSeriesMatch {
    pub external_id: String,
    pub name: String,
}

#[async_trait]
pub trait TvMetadataProvider: Send + Sync {
    async fn find_series(&self, name: &str) -> anyhow::Result<Option<TvSeriesMatch>>;
    async fn fetch_season_episodes(&self, series_external_id: &str, season_number: u32) -> anyhow::Result<Vec<TvEpisode>>;
}

#[derive(Debug, Clone)]
pub struct MovieMatch {
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub confidence: f64,
}

#[async_trait]
pub trait MovieMetadataProvider: Send + Sync {
    async fn find_movie(&self, title: &str, year: Option<i32>) -> anyhow::Result<Option<MovieMatch>>;
}

/// Used when no TMDB API key is configured: every lookup is an external
/// metadata miss, which the preview pipeline treats as "proceed without
/// enrichment", never as an error.
#[derive(Debug, Default)]
pub struct NullTvProvider;

#[async_trait]
impl TvMetadataProvider for NullTvProvider {
    async fn find_series(&self, _name: &str) -> anyhow::Result<Option<TvSeriesMatch>> {
        Ok(None)
    }

    async fn fetch_season_episodes(&self, _series_external_id: &str, _season_number: u32) -> anyhow::Result<Vec<TvEpisode>> {
        Ok(Vec::new())
    }
}

/// Used when no OMDb API key is configured.
#[derive(Debug, Default)]
pub struct NullMovieProvider;

#[async_trait]
impl MovieMetadataProvider for NullMovieProvider {
    async fn find_movie(&self, _title: &str, _year: Option<i32>) -> anyhow::Result<Option<MovieMatch>> {
        Ok(None)
    }
}
