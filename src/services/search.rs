/// Search & enrichment pipeline
///
/// Turns a user query into persisted, trailer-enriched movies:
/// 1. Skip entirely when no criterion is given
/// 2. Query the catalog (title search, or discover when only filters are set)
/// 3. Filter hits by year, minimum rating and genre
/// 4. Look up a trailer per hit, concurrently and bounded
/// 5. Find-or-insert each hit into the movie repository, in order
use std::{sync::Arc, time::Duration};
use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogMovie, Genre, Movie, NewMovie},
    repositories::MovieRepository,
    services::catalog::{trailer_url, DiscoverFilters, MovieCatalog},
};

const POSTER_SIZE: &str = "w342";
const BACKDROP_SIZE: &str = "w780";

/// A validated search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub title: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub min_rating: Option<f64>,
}

impl SearchQuery {
    /// Title-only query
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates raw request parameters
    ///
    /// Blank parameters count as absent. The year must be a 4-digit numeral
    /// and the minimum rating a finite number.
    pub fn parse(
        title: Option<&str>,
        genre: Option<&str>,
        year: Option<&str>,
        min_rating: Option<&str>,
    ) -> AppResult<Self> {
        let year = match non_blank(year) {
            None => None,
            Some(raw) if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) => {
                Some(raw.parse::<i32>().map_err(|e| {
                    AppError::InvalidInput(format!("Invalid year '{}': {}", raw, e))
                })?)
            }
            Some(raw) => {
                return Err(AppError::InvalidInput(format!(
                    "Year must be a 4-digit number, got '{}'",
                    raw
                )))
            }
        };

        let min_rating = match non_blank(min_rating) {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(rating) if rating.is_finite() => Some(rating),
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "Minimum rating must be a number, got '{}'",
                        raw
                    )))
                }
            },
        };

        Ok(Self {
            title: non_blank(title).unwrap_or_default().to_string(),
            genre: non_blank(genre).map(str::to_string),
            year,
            min_rating,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.genre.is_none()
            && self.year.is_none()
            && self.min_rating.is_none()
    }

    /// Client-side filter applied to every catalog hit
    pub fn accepts(&self, hit: &CatalogMovie, genre_id: Option<i64>) -> bool {
        let year_ok = self.year.map_or(true, |year| {
            hit.release_date
                .as_deref()
                .is_some_and(|date| date.starts_with(&format!("{:04}", year)))
        });
        let rating_ok = self
            .min_rating
            .map_or(true, |min| hit.vote_average.is_some_and(|r| r >= min));
        let genre_ok = genre_id.map_or(true, |id| hit.genre_ids.contains(&id));

        year_ok && rating_ok && genre_ok
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Finds a genre by case-insensitive name or by numeric id
pub fn resolve_genre(genres: &[Genre], requested: &str) -> Option<i64> {
    let requested = requested.trim();
    if let Ok(id) = requested.parse::<i64>() {
        return genres.iter().find(|g| g.id == id).map(|g| g.id);
    }
    genres
        .iter()
        .find(|g| g.name.eq_ignore_ascii_case(requested))
        .map(|g| g.id)
}

/// Tuning knobs for the pipeline
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Base URL of the catalog's image CDN
    pub image_base_url: String,
    /// Maximum trailer lookups in flight
    pub trailer_concurrency: usize,
    /// Deadline for a single trailer lookup
    pub trailer_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            trailer_concurrency: 8,
            trailer_timeout: Duration::from_secs(10),
        }
    }
}

pub struct SearchPipeline {
    catalog: Arc<dyn MovieCatalog>,
    repository: Arc<dyn MovieRepository>,
    settings: SearchSettings,
}

impl SearchPipeline {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        repository: Arc<dyn MovieRepository>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            catalog,
            repository,
            settings,
        }
    }

    /// Runs the whole pipeline
    ///
    /// A failed catalog query is returned as an error. Failed trailer lookups
    /// leave that movie without a trailer; failed inserts drop that movie.
    pub async fn search_movies(&self, query: &SearchQuery) -> AppResult<Vec<Movie>> {
        if query.is_empty() {
            tracing::debug!("Empty search query, skipping catalog");
            return Ok(Vec::new());
        }

        let genres = self.load_genres(query).await?;
        let genre_id = match &query.genre {
            Some(requested) => match resolve_genre(&genres, requested) {
                Some(id) => Some(id),
                None => {
                    tracing::info!(genre = %requested, "Unknown genre, no movies can match");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let hits = if query.title.trim().is_empty() {
            let filters = DiscoverFilters {
                year: query.year,
                genre_id,
                min_rating: query.min_rating,
            };
            self.catalog.discover_movies(&filters).await?
        } else {
            self.catalog.search_movies(query.title.trim()).await?
        };

        let total_hits = hits.len();
        let hits: Vec<CatalogMovie> = hits
            .into_iter()
            .filter(|hit| query.accepts(hit, genre_id))
            .collect();

        tracing::info!(
            title = %query.title,
            total_hits,
            kept = hits.len(),
            "Catalog results filtered"
        );

        let trailers = self.fetch_trailers(&hits).await;
        let enriched: Vec<NewMovie> = hits
            .into_iter()
            .zip(trailers)
            .map(|(hit, trailer)| self.to_new_movie(hit, trailer, &genres))
            .collect();

        Ok(self.persist(enriched).await)
    }

    /// The genre mapping is mandatory only when the query filters by genre
    async fn load_genres(&self, query: &SearchQuery) -> AppResult<Vec<Genre>> {
        match self.catalog.movie_genres().await {
            Ok(genres) => Ok(genres),
            Err(e) if query.genre.is_some() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Genre list unavailable, movies will carry no genres");
                Ok(Vec::new())
            }
        }
    }

    /// One trailer lookup per hit, returned in hit order
    async fn fetch_trailers(&self, hits: &[CatalogMovie]) -> Vec<Option<String>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.trailer_concurrency.max(1)));
        let mut tasks = Vec::with_capacity(hits.len());

        for hit in hits {
            let catalog = Arc::clone(&self.catalog);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.settings.trailer_timeout;
            let tmdb_id = hit.id;

            let task = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match tokio::time::timeout(timeout, catalog.movie_videos(tmdb_id)).await {
                    Ok(Ok(videos)) => trailer_url(&videos),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, tmdb_id, "Trailer lookup failed");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(tmdb_id, ?timeout, "Trailer lookup timed out");
                        None
                    }
                }
            });
            tasks.push(task);
        }

        let mut trailers = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(trailer) => trailers.push(trailer),
                Err(e) => {
                    tracing::error!(error = %e, "Trailer task join error");
                    trailers.push(None);
                }
            }
        }
        trailers
    }

    fn image_url(&self, size: &str, path: Option<String>) -> Option<String> {
        path.filter(|p| !p.trim().is_empty())
            .map(|p| format!("{}/{}{}", self.settings.image_base_url, size, p))
    }

    fn to_new_movie(
        &self,
        hit: CatalogMovie,
        trailer_url: Option<String>,
        genres: &[Genre],
    ) -> NewMovie {
        let genre_names = hit
            .genre_ids
            .iter()
            .filter_map(|id| genres.iter().find(|g| g.id == *id))
            .map(|g| g.name.clone())
            .collect();

        NewMovie {
            tmdb_id: Some(hit.id),
            title: hit.title,
            overview: hit.overview,
            release_date: hit.release_date,
            poster_url: self.image_url(POSTER_SIZE, hit.poster_path),
            backdrop_url: self.image_url(BACKDROP_SIZE, hit.backdrop_path),
            genres: genre_names,
            vote_average: hit.vote_average,
            trailer_url,
        }
    }

    /// Sequential find-or-insert; failures drop only the affected movie
    async fn persist(&self, enriched: Vec<NewMovie>) -> Vec<Movie> {
        let mut saved = Vec::with_capacity(enriched.len());

        for movie in enriched {
            let tmdb_id = movie.tmdb_id;
            match self.repository.create(movie).await {
                Ok(stored) => saved.push(stored),
                Err(e) => {
                    tracing::warn!(error = %e, ?tmdb_id, "Dropping movie that failed to persist");
                }
            }
        }

        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogVideo;
    use crate::repositories::{InMemoryMovieRepository, MockMovieRepository};
    use crate::services::catalog::MockMovieCatalog;
    use tokio_test::{assert_err, assert_ok};

    fn hit(id: i64, title: &str, release_date: &str, rating: f64) -> CatalogMovie {
        CatalogMovie {
            id,
            title: title.to_string(),
            overview: String::new(),
            release_date: Some(release_date.to_string()),
            poster_path: Some(format!("/{}.jpg", id)),
            backdrop_path: None,
            vote_average: Some(rating),
            genre_ids: vec![28],
        }
    }

    fn genres() -> Vec<Genre> {
        vec![
            Genre {
                id: 28,
                name: "Action".to_string(),
            },
            Genre {
                id: 18,
                name: "Drama".to_string(),
            },
        ]
    }

    fn trailer(key: &str) -> Vec<CatalogVideo> {
        vec![CatalogVideo {
            key: key.to_string(),
            site: "YouTube".to_string(),
            video_type: "Trailer".to_string(),
        }]
    }

    /// Catalog that answers a title search with `hits` and has a trailer for every movie
    fn catalog_with(hits: Vec<CatalogMovie>) -> MockMovieCatalog {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movie_genres()
            .returning(|| Ok(genres()));
        catalog
            .expect_search_movies()
            .returning(move |_| Ok(hits.clone()));
        catalog
            .expect_movie_videos()
            .returning(|id| Ok(trailer(&format!("key{}", id))));
        catalog
    }

    fn pipeline(catalog: MockMovieCatalog, repository: Arc<dyn MovieRepository>) -> SearchPipeline {
        SearchPipeline::new(Arc::new(catalog), repository, SearchSettings::default())
    }

    #[test]
    fn test_parse_treats_blank_as_absent() {
        let query = SearchQuery::parse(Some("Inception"), Some(""), Some(" "), None).unwrap();
        assert_eq!(query, SearchQuery::title("Inception"));
    }

    #[test]
    fn test_parse_validates_year_and_rating() {
        assert_err!(SearchQuery::parse(Some("x"), None, Some("10"), None));
        assert_err!(SearchQuery::parse(Some("x"), None, Some("201O"), None));
        assert_err!(SearchQuery::parse(Some("x"), None, None, Some("high")));
        assert_err!(SearchQuery::parse(Some("x"), None, None, Some("NaN")));

        let query = assert_ok!(SearchQuery::parse(None, Some("Drama"), Some("2010"), Some("7")));
        assert_eq!(query.year, Some(2010));
        assert_eq!(query.min_rating, Some(7.0));
        assert_eq!(query.genre.as_deref(), Some("Drama"));
        assert!(!query.is_empty());
    }

    #[test]
    fn test_year_filter_keeps_matching_release_year() {
        let query = SearchQuery {
            year: Some(2010),
            ..SearchQuery::title("x")
        };
        assert!(query.accepts(&hit(1, "a", "2010-07-16", 8.0), None));
        assert!(!query.accepts(&hit(2, "b", "1999-03-01", 8.0), None));

        let mut undated = hit(3, "c", "", 8.0);
        undated.release_date = None;
        assert!(!query.accepts(&undated, None));
    }

    #[test]
    fn test_min_rating_filter() {
        let query = SearchQuery {
            min_rating: Some(7.0),
            ..SearchQuery::title("x")
        };
        assert!(query.accepts(&hit(1, "a", "2010-01-01", 8.8), None));
        assert!(!query.accepts(&hit(2, "b", "2010-01-01", 5.0), None));
        assert!(query.accepts(&hit(3, "c", "2010-01-01", 7.0), None));
    }

    #[test]
    fn test_resolve_genre() {
        assert_eq!(resolve_genre(&genres(), "action"), Some(28));
        assert_eq!(resolve_genre(&genres(), " DRAMA "), Some(18));
        assert_eq!(resolve_genre(&genres(), "18"), Some(18));
        assert_eq!(resolve_genre(&genres(), "Western"), None);
    }

    #[tokio::test]
    async fn test_empty_query_never_calls_catalog() {
        // No expectations: any catalog call would panic
        let pipeline = pipeline(
            MockMovieCatalog::new(),
            Arc::new(InMemoryMovieRepository::new()),
        );
        let movies = pipeline.search_movies(&SearchQuery::default()).await.unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_search_enriches_and_persists() {
        let repository = Arc::new(InMemoryMovieRepository::new());
        let pipeline = pipeline(
            catalog_with(vec![hit(27205, "Inception", "2010-07-16", 8.8)]),
            repository.clone(),
        );

        let first = pipeline.search_movies(&SearchQuery::title("Inception")).await.unwrap();
        assert_eq!(first.len(), 1);
        let movie = &first[0];
        assert_eq!(movie.tmdb_id, 27205);
        assert_eq!(
            movie.trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=key27205")
        );
        assert_eq!(
            movie.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w342/27205.jpg")
        );
        assert_eq!(movie.backdrop_url, None);
        assert_eq!(movie.genres, vec!["Action".to_string()]);

        let second = pipeline.search_movies(&SearchQuery::title("Inception")).await.unwrap();
        assert_eq!(second[0].id, movie.id);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_filters_apply_before_enrichment() {
        let repository = Arc::new(InMemoryMovieRepository::new());
        let pipeline = pipeline(
            catalog_with(vec![
                hit(1, "Inception", "2010-07-16", 8.8),
                hit(2, "The Matrix", "1999-03-01", 8.2),
                hit(3, "Tron: Legacy", "2010-12-10", 5.0),
            ]),
            repository,
        );

        let query = SearchQuery::parse(Some("any"), None, Some("2010"), Some("7")).unwrap();
        let movies = pipeline.search_movies(&query).await.unwrap();
        let ids: Vec<_> = movies.iter().map(|m| m.tmdb_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_genre_filter() {
        let mut drama = hit(2, "Drama", "2010-01-01", 8.0);
        drama.genre_ids = vec![18];

        let pipeline = pipeline(
            catalog_with(vec![hit(1, "Action", "2010-01-01", 8.0), drama]),
            Arc::new(InMemoryMovieRepository::new()),
        );

        let query = SearchQuery {
            genre: Some("drama".to_string()),
            ..SearchQuery::title("x")
        };
        let movies = pipeline.search_movies(&query).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].tmdb_id, 2);
        assert_eq!(movies[0].genres, vec!["Drama".to_string()]);

        let unknown = SearchQuery {
            genre: Some("Western".to_string()),
            ..SearchQuery::title("x")
        };
        assert!(pipeline.search_movies(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_title_less_query_uses_discover() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movie_genres().returning(|| Ok(genres()));
        catalog
            .expect_discover_movies()
            .withf(|filters| filters.year == Some(2014) && filters.genre_id == Some(18))
            .times(1)
            .returning(|_| {
                let mut movie = hit(157336, "Interstellar", "2014-11-05", 8.4);
                movie.genre_ids = vec![18];
                Ok(vec![movie])
            });
        catalog.expect_search_movies().never();
        catalog.expect_movie_videos().returning(|_| Ok(Vec::new()));

        let pipeline = pipeline(catalog, Arc::new(InMemoryMovieRepository::new()));
        let query = SearchQuery::parse(None, Some("Drama"), Some("2014"), None).unwrap();
        let movies = pipeline.search_movies(&query).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].trailer_url, None);
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movie_genres().returning(|| Ok(genres()));
        catalog
            .expect_search_movies()
            .returning(|_| Err(AppError::ExternalApi("TMDB search failed".to_string())));

        let pipeline = pipeline(catalog, Arc::new(InMemoryMovieRepository::new()));
        let result = pipeline.search_movies(&SearchQuery::title("Inception")).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_genre_list_failure_only_matters_for_genre_queries() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movie_genres()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));
        catalog
            .expect_search_movies()
            .returning(|_| Ok(vec![hit(1, "Inception", "2010-07-16", 8.8)]));
        catalog.expect_movie_videos().returning(|_| Ok(Vec::new()));

        let pipeline = pipeline(catalog, Arc::new(InMemoryMovieRepository::new()));

        let movies = pipeline.search_movies(&SearchQuery::title("Inception")).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert!(movies[0].genres.is_empty());

        let by_genre = SearchQuery {
            genre: Some("Action".to_string()),
            ..SearchQuery::title("Inception")
        };
        assert!(pipeline.search_movies(&by_genre).await.is_err());
    }

    #[tokio::test]
    async fn test_trailer_failure_degrades_per_item() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movie_genres().returning(|| Ok(genres()));
        catalog.expect_search_movies().returning(|_| {
            Ok(vec![
                hit(1, "Inception", "2010-07-16", 8.8),
                hit(2, "Interstellar", "2014-11-05", 8.4),
            ])
        });
        catalog.expect_movie_videos().returning(|id| {
            if id == 1 {
                Err(AppError::ExternalApi("videos unavailable".to_string()))
            } else {
                Ok(trailer("zSWdZVtXT7E"))
            }
        });

        let pipeline = pipeline(catalog, Arc::new(InMemoryMovieRepository::new()));
        let movies = pipeline.search_movies(&SearchQuery::title("Nolan")).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].tmdb_id, 1);
        assert_eq!(movies[0].trailer_url, None);
        assert_eq!(
            movies[1].trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=zSWdZVtXT7E")
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_drops_only_that_movie() {
        let hits = vec![
            hit(1, "First", "2001-01-01", 7.0),
            hit(2, "Second", "2002-01-01", 7.0),
            hit(3, "Third", "2003-01-01", 7.0),
        ];

        let mut repository = MockMovieRepository::new();
        repository.expect_create().times(3).returning(|movie| {
            let tmdb_id = movie.tmdb_id.unwrap_or_default();
            if tmdb_id == 2 {
                return Err(AppError::Internal("insert failed".to_string()));
            }
            Ok(movie.sanitize()?.into_movie(tmdb_id * 10, chrono::Utc::now()))
        });

        let pipeline = pipeline(catalog_with(hits), Arc::new(repository));
        let movies = pipeline.search_movies(&SearchQuery::title("x")).await.unwrap();

        let ids: Vec<_> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    /// Catalog whose video endpoint never answers in time
    struct SlowCatalog;

    #[async_trait::async_trait]
    impl MovieCatalog for SlowCatalog {
        async fn search_movies(&self, _query: &str) -> AppResult<Vec<CatalogMovie>> {
            Ok(vec![hit(1, "Inception", "2010-07-16", 8.8)])
        }

        async fn discover_movies(&self, _filters: &DiscoverFilters) -> AppResult<Vec<CatalogMovie>> {
            Ok(Vec::new())
        }

        async fn movie_videos(&self, _tmdb_id: i64) -> AppResult<Vec<CatalogVideo>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(trailer("late"))
        }

        async fn movie_genres(&self) -> AppResult<Vec<Genre>> {
            Ok(genres())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_slow_trailer_lookup_times_out() {
        let settings = SearchSettings {
            trailer_timeout: Duration::from_millis(20),
            trailer_concurrency: 1,
            ..SearchSettings::default()
        };
        let pipeline = SearchPipeline::new(
            Arc::new(SlowCatalog),
            Arc::new(InMemoryMovieRepository::new()),
            settings,
        );

        let movies = pipeline.search_movies(&SearchQuery::title("Inception")).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].trailer_url, None);
    }
}
