/// Movie catalog abstraction
///
/// The catalog is the third-party metadata source (TMDB). The search
/// pipeline only talks to it through [`MovieCatalog`], so tests can swap in
/// a stub or a mock.
use crate::{
    error::AppResult,
    models::{CatalogMovie, CatalogVideo, Genre},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

const TRAILER_SITE: &str = "YouTube";
const TRAILER_TYPE: &str = "Trailer";
const TRAILER_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Structured filters for a title-less catalog query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilters {
    pub year: Option<i32>,
    pub genre_id: Option<i64>,
    pub min_rating: Option<f64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Free-text title search
    async fn search_movies(&self, query: &str) -> AppResult<Vec<CatalogMovie>>;

    /// Browse the catalog with server-side filters
    async fn discover_movies(&self, filters: &DiscoverFilters) -> AppResult<Vec<CatalogMovie>>;

    /// Videos attached to a movie
    async fn movie_videos(&self, tmdb_id: i64) -> AppResult<Vec<CatalogVideo>>;

    /// The catalog's genre id ↔ name mapping
    async fn movie_genres(&self) -> AppResult<Vec<Genre>>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Watch URL of the first YouTube trailer, if any
pub fn trailer_url(videos: &[CatalogVideo]) -> Option<String> {
    videos
        .iter()
        .find(|v| v.site == TRAILER_SITE && v.video_type == TRAILER_TYPE)
        .map(|v| format!("{}{}", TRAILER_WATCH_URL, v.key))
}
