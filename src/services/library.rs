/// Derived per-movie state built on top of the interaction store.
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{Interaction, InteractionKind, Movie},
    repositories::MovieRepository,
    services::interactions::InteractionStore,
};

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added { interaction: Interaction },
    Removed { id: u64 },
}

/// Flags the front end shows on a movie card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovieStatus {
    pub watched: bool,
    pub in_watchlist: bool,
}

impl MovieStatus {
    pub fn from_interactions(interactions: &[Interaction]) -> Self {
        Self {
            watched: interactions
                .iter()
                .any(|i| i.interaction_type == InteractionKind::Watched),
            in_watchlist: interactions
                .iter()
                .any(|i| i.interaction_type == InteractionKind::Watchlist),
        }
    }
}

/// The user's movies, split by interaction kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub watched: Vec<Movie>,
    pub watchlist: Vec<Movie>,
}

/// Adds the interaction when absent, removes it when present
///
/// Marking a movie watched stamps today's date.
pub async fn toggle(store: &InteractionStore, movie_id: i64, kind: InteractionKind) -> ToggleOutcome {
    let existing = store
        .get_by_movie(movie_id, None)
        .await
        .into_iter()
        .find(|i| i.interaction_type == kind && i.user_id.is_none());

    if let Some(existing) = existing {
        if store.remove(existing.id).await {
            return ToggleOutcome::Removed { id: existing.id };
        }
        // Removed elsewhere since it was read; the toggle adds it back
        tracing::debug!(id = existing.id, movie_id, "Interaction already gone, adding");
    }

    let watched_date = match kind {
        InteractionKind::Watched => Some(Utc::now().date_naive()),
        InteractionKind::Watchlist => None,
    };
    let interaction = store.create(movie_id, kind, watched_date, None).await;
    ToggleOutcome::Added { interaction }
}

pub async fn status(store: &InteractionStore, movie_id: i64) -> MovieStatus {
    MovieStatus::from_interactions(&store.get_by_movie(movie_id, None).await)
}

/// Movies referenced by interactions. Ids missing from the repository are skipped.
pub async fn profile(
    store: &InteractionStore,
    repository: &dyn MovieRepository,
) -> AppResult<Profile> {
    let interactions = store.list().await;
    let mut profile = Profile::default();
    let mut seen = HashSet::new();

    for interaction in &interactions {
        if !seen.insert((interaction.movie_id, interaction.interaction_type)) {
            continue;
        }

        let Some(movie) = repository.get_by_id(interaction.movie_id).await? else {
            tracing::debug!(movie_id = interaction.movie_id, "Interaction for unknown movie");
            continue;
        };

        match interaction.interaction_type {
            InteractionKind::Watched => profile.watched.push(movie),
            InteractionKind::Watchlist => profile.watchlist.push(movie),
        }
    }

    Ok(profile)
}
