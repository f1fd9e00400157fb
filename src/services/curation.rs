use crate::{
    error::AppResult,
    models::{Movie, MovieSortField, NewMovie},
    repositories::MovieRepository,
};

/// How many movies the dashboard shows
pub const TRENDING_LIMIT: i64 = 12;

/// Below this many stored movies the curated list is seeded
const SEED_THRESHOLD: usize = 4;

/// Hand-picked movies used to fill an empty dashboard
pub fn curated_movies() -> Vec<NewMovie> {
    vec![
        NewMovie {
            tmdb_id: Some(346698),
            title: "Barbie".to_string(),
            overview: "Barbie and Ken are having the time of their lives...".to_string(),
            release_date: Some("2023-07-21".to_string()),
            poster_url: Some(
                "https://images.unsplash.com/photo-1594736797933-d0401ba2fe65?w=300&h=450&fit=crop".to_string(),
            ),
            backdrop_url: Some(
                "https://images.unsplash.com/photo-1594736797933-d0401ba2fe65?w=800&h=400&fit=crop".to_string(),
            ),
            genres: vec!["Comedy".to_string(), "Adventure".to_string()],
            vote_average: Some(7.1),
            trailer_url: Some("https://www.youtube.com/watch?v=pBk4NYhWNMM".to_string()),
        },
        NewMovie {
            tmdb_id: Some(603692),
            title: "John Wick: Chapter 4".to_string(),
            overview: "With the price on his head ever increasing...".to_string(),
            release_date: Some("2023-03-24".to_string()),
            poster_url: Some(
                "https://images.unsplash.com/photo-1485846234645-a62644f84728?w=300&h=450&fit=crop".to_string(),
            ),
            backdrop_url: Some(
                "https://images.unsplash.com/photo-1485846234645-a62644f84728?w=800&h=400&fit=crop".to_string(),
            ),
            genres: vec!["Action".to_string(), "Thriller".to_string()],
            vote_average: Some(7.8),
            trailer_url: Some("https://www.youtube.com/watch?v=qEVUtrk8_B4".to_string()),
        },
    ]
}

/// Latest movies for the dashboard, seeding the curated list when the
/// repository is nearly empty
pub async fn trending(repository: &dyn MovieRepository) -> AppResult<Vec<Movie>> {
    let latest = repository
        .list(MovieSortField::CreatedAt, TRENDING_LIMIT)
        .await?;

    if latest.len() >= SEED_THRESHOLD {
        return Ok(latest);
    }

    tracing::info!(stored = latest.len(), "Seeding curated movies");
    for movie in curated_movies() {
        let title = movie.title.clone();
        if let Err(e) = repository.create(movie).await {
            tracing::warn!(error = %e, title = %title, "Failed to seed curated movie");
        }
    }

    repository
        .list(MovieSortField::CreatedAt, TRENDING_LIMIT)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryMovieRepository;

    fn movie(tmdb_id: i64) -> NewMovie {
        NewMovie {
            tmdb_id: Some(tmdb_id),
            title: format!("Movie {}", tmdb_id),
            ..NewMovie::default()
        }
    }

    #[tokio::test]
    async fn test_seeds_empty_repository() {
        let repo = InMemoryMovieRepository::new();

        let movies = trending(&repo).await.unwrap();
        assert_eq!(movies.len(), 2);

        // Seeding again is a no-op thanks to find-or-insert
        let again = trending(&repo).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_full_repository_is_not_seeded() {
        let repo = InMemoryMovieRepository::new();
        for id in 1..=5 {
            repo.create(movie(id)).await.unwrap();
        }

        let movies = trending(&repo).await.unwrap();
        assert_eq!(movies.len(), 5);
        assert!(movies.iter().all(|m| m.tmdb_id <= 5));
    }

    #[test]
    fn test_curated_movies_are_valid() {
        for movie in curated_movies() {
            let draft = movie.sanitize().unwrap();
            assert!(draft.release_date.is_some());
            assert!(draft.trailer_url.is_some());
        }
    }
}
