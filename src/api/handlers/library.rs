use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::AppState,
    error::AppResult,
    models::InteractionKind,
    services::library::{self, MovieStatus, Profile, ToggleOutcome},
};

pub async fn status(State(state): State<AppState>, Path(movie_id): Path<i64>) -> Json<MovieStatus> {
    Json(library::status(&state.store, movie_id).await)
}

pub async fn toggle(
    State(state): State<AppState>,
    Path((movie_id, kind)): Path<(i64, String)>,
) -> AppResult<Json<ToggleOutcome>> {
    let kind: InteractionKind = kind.parse()?;
    let outcome = library::toggle(&state.store, movie_id, kind).await;

    tracing::info!(movie_id, %kind, ?outcome, "Interaction toggled");
    Ok(Json(outcome))
}

pub async fn profile(State(state): State<AppState>) -> AppResult<Json<Profile>> {
    let profile = library::profile(&state.store, state.repository.as_ref()).await?;
    Ok(Json(profile))
}
