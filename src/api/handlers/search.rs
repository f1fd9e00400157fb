use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::AppResult,
    middleware::RequestId,
    models::Movie,
    services::SearchQuery,
};

/// Raw query parameters; validated by [`SearchQuery::parse`]
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    title: Option<String>,
    genre: Option<String>,
    year: Option<String>,
    min_rating: Option<String>,
}

/// Searches the catalog and returns the persisted, enriched movies
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Movie>>> {
    let query = SearchQuery::parse(
        params.title.as_deref(),
        params.genre.as_deref(),
        params.year.as_deref(),
        params.min_rating.as_deref(),
    )?;

    tracing::info!(request_id = %request_id, ?query, "Searching movies");

    let movies = state.pipeline.search_movies(&query).await?;
    Ok(Json(movies))
}
