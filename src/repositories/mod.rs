/// Movie repository abstraction
///
/// Movies are stored once per TMDB id. The PostgreSQL implementation is used
/// in deployments; the in-memory one backs tests and local runs without a
/// database.
use crate::{
    error::AppResult,
    models::{Movie, MovieFilter, MovieSortField, NewMovie},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryMovieRepository;
pub use postgres::PgMovieRepository;

/// Default page size for `list`
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Durable, de-duplicated storage of movie records
///
/// Every failure is logged at this boundary and returned as a tagged
/// [`AppError`](crate::error::AppError), so callers can tell an empty result
/// from a failed one.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieRepository: Send + Sync {
    /// Find-or-insert by TMDB id
    ///
    /// Returns the stored movie unchanged when one already exists for the id,
    /// otherwise sanitizes and inserts the payload.
    async fn create(&self, movie: NewMovie) -> AppResult<Movie>;

    /// Up to `limit` movies, descending by `sort_by`
    async fn list(&self, sort_by: MovieSortField, limit: i64) -> AppResult<Vec<Movie>>;

    /// Movies matching every field set in `criteria`
    async fn filter(&self, criteria: &MovieFilter) -> AppResult<Vec<Movie>>;

    /// A single movie by repository id; `None` when absent
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Movie>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
