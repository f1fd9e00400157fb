use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    models::{Movie, MovieFilter, MovieSortField, NewMovie},
    repositories::DEFAULT_LIST_LIMIT,
    services::curation,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    sort_by: Option<String>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Movie>>> {
    let sort_by = MovieSortField::parse_or_default(params.sort_by.as_deref());
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0);

    let movies = state.repository.list(sort_by, limit).await?;
    Ok(Json(movies))
}

/// Find-or-insert by TMDB id
pub async fn create(
    State(state): State<AppState>,
    Json(movie): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = state.repository.create(movie).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn filter(
    State(state): State<AppState>,
    Query(criteria): Query<MovieFilter>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.repository.filter(&criteria).await?;
    Ok(Json(movies))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Movie>> {
    state
        .repository
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
}

/// Latest movies, seeding the curated list into a near-empty repository
pub async fn trending(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let movies = curation::trending(state.repository.as_ref()).await?;
    Ok(Json(movies))
}
