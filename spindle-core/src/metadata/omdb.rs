//! OMDb movie-metadata client, a fallback source alongside TMDB.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;

use super::{MovieMatch, MovieMetadataProvider};

const BASE_URL: &str = "https://www.omdbapi.com/";

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "Title")]
    title_alt: Option<String>,
    year: Option<String>,
    #[serde(rename = "Year")]
    year_alt: Option<String>,
    response: Option<String>,
    #[serde(rename = "Response")]
    response_alt: Option<String>,
}

pub struct OmdbProvider {
    client: Client,
    api_key: String,
    cache: DashMap<(String, Option<i32>), Option<MovieMatch>>,
}

impl OmdbProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl MovieMetadataProvider for OmdbProvider {
    async fn find_movie(&self, title: &str, year: Option<i32>) -> anyhow::Result<Option<MovieMatch>> {
        let key = (title.to_string(), year);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let mut query = vec![("apikey", self.api_key.clone()), ("t", title.to_string())];
        if let Some(year) = year {
            query.push(("y", year.to_string()));
        }

        let response = self.client.get(BASE_URL).query(&query).send().await?.json::<OmdbResponse>().await?;
        let ok = response.response.as_deref() == Some("True") || response.response_alt.as_deref() == Some("True");
        let result = if ok {
            let matched_title = response.title.or(response.title_alt).unwrap_or_else(|| title.to_string());
            let matched_year = response
                .year
                .or(response.year_alt)
                .and_then(|y| y.get(0..4).and_then(|s| s.parse::<i32>().ok()));
            Some(MovieMatch {
                imdb_id: response.imdb_id,
                title: matched_title,
                year: matched_year.or(year),
                confidence: 0.9,
            })
        } else {
            None
        };

        self.cache.insert(key, result.clone());
        Ok(result)
    }
}
