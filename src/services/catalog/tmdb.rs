/// TMDB catalog client
///
/// Endpoints used:
/// 1. Title search: /search/movie
/// 2. Filtered browse: /discover/movie
/// 3. Trailers: /movie/{id}/videos
/// 4. Genre mapping: /genre/movie/list (fetched once per process)
use reqwest::Client as HttpClient;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogMovie, CatalogPage, CatalogVideo, Genre, GenreList, VideoList},
    services::catalog::{DiscoverFilters, MovieCatalog},
};

/// Genre names are matched against user input, so they are always requested
/// in English regardless of the catalog language.
const GENRE_LANGUAGE: &str = "en-US";

pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    genres: OnceCell<Vec<Genre>>,
}

impl TmdbCatalog {
    /// Creates a TMDB client whose requests all time out after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        language: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            genres: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for {}: {}",
                status, path, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    fn discover_query(&self, filters: &DiscoverFilters) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("language", self.language.clone()),
            ("include_adult", "false".to_string()),
            ("sort_by", "popularity.desc".to_string()),
        ];
        if let Some(year) = filters.year {
            query.push(("primary_release_year", year.to_string()));
        }
        if let Some(genre_id) = filters.genre_id {
            query.push(("with_genres", genre_id.to_string()));
        }
        if let Some(min_rating) = filters.min_rating {
            query.push(("vote_average.gte", min_rating.to_string()));
        }
        query
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<CatalogMovie>> {
        let page: CatalogPage = self
            .get_json(
                "/search/movie",
                &[
                    ("query", query.to_string()),
                    ("language", self.language.clone()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;

        tracing::info!(
            query = %query,
            results = page.results.len(),
            total_results = page.total_results,
            catalog = "tmdb",
            "Title search completed"
        );

        Ok(page.results)
    }

    async fn discover_movies(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogMovie>> {
        let page: CatalogPage = self
            .get_json("/discover/movie", &self.discover_query(filters))
            .await?;

        tracing::info!(
            ?filters,
            results = page.results.len(),
            catalog = "tmdb",
            "Discover query completed"
        );

        Ok(page.results)
    }

    async fn movie_videos(&self, tmdb_id: i64) -> AppResult<Vec<CatalogVideo>> {
        // No language parameter: most trailers are only published in English
        let videos: VideoList = self
            .get_json(&format!("/movie/{}/videos", tmdb_id), &[])
            .await?;

        tracing::debug!(tmdb_id, videos = videos.results.len(), "Videos fetched");

        Ok(videos.results)
    }

    async fn movie_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = self
            .genres
            .get_or_try_init(|| async {
                let list: GenreList = self
                    .get_json(
                        "/genre/movie/list",
                        &[("language", GENRE_LANGUAGE.to_string())],
                    )
                    .await?;
                tracing::info!(genres = list.genres.len(), "Loaded TMDB genre list");
                Ok::<_, AppError>(list.genres)
            })
            .await?;

        Ok(genres.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
