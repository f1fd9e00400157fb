use chrono::Utc;
use std::cmp::Ordering;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Movie, MovieFilter, MovieSortField, NewMovie},
    repositories::MovieRepository,
};

struct Table {
    movies: Vec<Movie>,
    next_id: i64,
}

/// Process-local movie repository
pub struct InMemoryMovieRepository {
    table: RwLock<Table>,
}

impl Default for InMemoryMovieRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMovieRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                movies: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored movies
    pub async fn len(&self) -> usize {
        self.table.read().await.movies.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Descending order for `sort_by`; absent ratings sort last, ties go to the newest id
fn compare_desc(sort_by: MovieSortField, a: &Movie, b: &Movie) -> Ordering {
    let primary = match sort_by {
        MovieSortField::CreatedAt => b.created_at.cmp(&a.created_at),
        MovieSortField::Title => b.title.cmp(&a.title),
        MovieSortField::VoteAverage => match (a.vote_average, b.vote_average) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary.then_with(|| b.id.cmp(&a.id))
}

#[async_trait::async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        let draft = movie.sanitize().inspect_err(|e| {
            tracing::error!(error = %e, "Refusing to create movie");
        })?;

        // Hold the write lock across lookup and insert so find-or-insert is atomic
        let mut table = self.table.write().await;
        if let Some(existing) = table.movies.iter().find(|m| m.tmdb_id == draft.tmdb_id) {
            return Ok(existing.clone());
        }

        let id = table.next_id;
        table.next_id += 1;
        let movie = draft.into_movie(id, Utc::now());
        table.movies.push(movie.clone());

        tracing::info!(id, tmdb_id = movie.tmdb_id, "Movie created");
        Ok(movie)
    }

    async fn list(&self, sort_by: MovieSortField, limit: i64) -> AppResult<Vec<Movie>> {
        let table = self.table.read().await;
        let mut movies = table.movies.clone();
        movies.sort_by(|a, b| compare_desc(sort_by, a, b));
        movies.truncate(limit.max(0) as usize);
        Ok(movies)
    }

    async fn filter(&self, criteria: &MovieFilter) -> AppResult<Vec<Movie>> {
        let table = self.table.read().await;
        Ok(table
            .movies
            .iter()
            .filter(|m| criteria.matches(m))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Movie>> {
        let table = self.table.read().await;
        Ok(table.movies.iter().find(|m| m.id == id).cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
