use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::AppState,
    models::{Interaction, InteractionFilter, NewInteraction},
};

#[derive(Debug, Default, Deserialize)]
pub struct UserParams {
    user_id: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Interaction>> {
    Json(state.store.list().await)
}

/// Returns the existing interaction when (movie, kind, user) is already taken
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewInteraction>,
) -> (StatusCode, Json<Interaction>) {
    let interaction = state
        .store
        .create(
            request.movie_id,
            request.interaction_type,
            request.watched_date,
            request.user_id,
        )
        .await;

    (StatusCode::CREATED, Json(interaction))
}

pub async fn filter(
    State(state): State<AppState>,
    Query(criteria): Query<InteractionFilter>,
) -> Json<Vec<Interaction>> {
    Json(state.store.filter(&criteria).await)
}

pub async fn by_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(params): Query<UserParams>,
) -> Json<Vec<Interaction>> {
    Json(
        state
            .store
            .get_by_movie(movie_id, params.user_id.as_deref())
            .await,
    )
}

/// Unknown ids are reported as `removed: false`
pub async fn remove(State(state): State<AppState>, Path(id): Path<u64>) -> Json<Value> {
    let removed = state.store.remove(id).await;
    Json(json!({ "removed": removed }))
}
