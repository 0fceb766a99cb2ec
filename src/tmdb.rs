use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Genre, GenreFilter, Movie, MovieSuggestion};

pub const MAX_SUGGESTIONS: usize = 5;
pub const MAX_DISCOVER_RESULTS: usize = 10;

/// Read-only access to the movie metadata service.
///
/// Only `get_movie_details` reports failure; the list operations degrade to
/// an empty result and log the cause.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn search_movies(&self, query: &str) -> Vec<MovieSuggestion>;
    async fn list_genres(&self) -> Vec<Genre>;
    async fn discover_by_genre(&self, filter: GenreFilter) -> Vec<Movie>;
    async fn get_movie_details(&self, id: u64) -> Result<Movie>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("movierag/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone())
    }

    async fn try_search(&self, query: &str) -> Result<Vec<MovieSuggestion>> {
        #[derive(Deserialize)]
        struct SearchResponse {
            results: Option<Vec<MovieSuggestion>>,
        }

        let path = format!("/search/movie?query={}", urlencoding::encode(query));
        let data: SearchResponse = self.get_json(&path).await?;
        let mut results = data
            .results
            .ok_or_else(|| anyhow!("search response has no results field"))?;
        results.truncate(MAX_SUGGESTIONS);
        Ok(results)
    }

    async fn try_genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreResponse {
            genres: Vec<Genre>,
        }

        let data: GenreResponse = self.get_json("/genre/movie/list?language=en-US").await?;
        Ok(data.genres)
    }

    async fn try_discover(&self, filter: GenreFilter) -> Result<Vec<Movie>> {
        let mut path = String::from(
            "/discover/movie?language=en-US&sort_by=popularity.desc&include_adult=false&include_video=false&page=1",
        );
        if let Some(id) = filter.genre_id() {
            path.push_str(&format!("&with_genres={id}"));
        }
        let data: DiscoverResponse = self.get_json(&path).await?;
        Ok(rank_discovered(data.results, filter))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path_and_query: &str) -> Result<T> {
        let sep = if path_and_query.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}{}api_key={}",
            self.base_url, path_and_query, sep, self.api_key
        );
        let path = path_and_query.split('?').next().unwrap_or(path_and_query);
        debug!("TMDB GET {}", path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", path))?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl MetadataApi for TmdbClient {
    async fn search_movies(&self, query: &str) -> Vec<MovieSuggestion> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Error fetching suggestions for '{}': {:#}", query, e);
                Vec::new()
            }
        }
    }

    async fn list_genres(&self) -> Vec<Genre> {
        match self.try_genres().await {
            Ok(genres) => genres,
            Err(e) => {
                warn!("Error fetching genres: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn discover_by_genre(&self, filter: GenreFilter) -> Vec<Movie> {
        match self.try_discover(filter).await {
            Ok(movies) => movies,
            Err(e) => {
                warn!("Error fetching movies for genre {}: {:#}", filter, e);
                Vec::new()
            }
        }
    }

    async fn get_movie_details(&self, id: u64) -> Result<Movie> {
        self.get_json::<Movie>(&format!("/movie/{id}"))
            .await
            .with_context(|| format!("Failed to fetch movie details for {}", id))
    }
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    results: Vec<DiscoverEntry>,
}

#[derive(Debug, Deserialize)]
struct DiscoverEntry {
    #[serde(flatten)]
    movie: Movie,
    #[serde(default)]
    popularity: f64,
}

/// Keeps entries matching the filter, most popular first, capped at
/// `MAX_DISCOVER_RESULTS`.
fn rank_discovered(mut entries: Vec<DiscoverEntry>, filter: GenreFilter) -> Vec<Movie> {
    if let Some(genre) = filter.genre_id() {
        entries.retain(|e| e.movie.genre_ids.contains(&genre));
    }
    entries.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    entries
        .into_iter()
        .take(MAX_DISCOVER_RESULTS)
        .map(|e| e.movie)
        .collect()
}
