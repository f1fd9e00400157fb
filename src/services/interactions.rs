/// Interaction store
///
/// Holds the authoritative set of watched / watchlist interactions and
/// mirrors it into an [`InteractionSlot`] as one JSON array. Queries reload
/// the slot first so changes made by another process are visible; mutations
/// write the full collection back before returning.
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    db::InteractionSlot,
    models::{Interaction, InteractionFilter, InteractionKind},
};

struct StoreState {
    interactions: Vec<Interaction>,
    next_id: u64,
}

impl StoreState {
    fn empty() -> Self {
        Self {
            interactions: Vec::new(),
            next_id: 1,
        }
    }

    /// Swaps in a freshly loaded collection. `next_id` never moves backwards,
    /// so ids freed by a removal are not handed out again.
    fn replace(&mut self, interactions: Vec<Interaction>) {
        let after_max = interactions
            .iter()
            .map(|i| i.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.next_id = self.next_id.max(after_max);
        self.interactions = interactions;
    }
}

enum Loaded {
    Snapshot(Vec<Interaction>),
    Unreachable,
}

/// Store for user interactions, backed by a single persisted slot
pub struct InteractionStore {
    slot: Arc<dyn InteractionSlot>,
    state: Mutex<StoreState>,
}

impl InteractionStore {
    /// Creates the store and loads the slot
    ///
    /// An unreachable or corrupt slot leaves the store empty; it never fails.
    pub async fn load(slot: Arc<dyn InteractionSlot>) -> Self {
        let mut state = StoreState::empty();
        if let Loaded::Snapshot(interactions) = Self::read_slot(slot.as_ref()).await {
            state.replace(interactions);
        }

        tracing::info!(
            slot = %slot.name(),
            interactions = state.interactions.len(),
            "Interaction store loaded"
        );

        Self {
            slot,
            state: Mutex::new(state),
        }
    }

    async fn read_slot(slot: &dyn InteractionSlot) -> Loaded {
        let raw = match slot.read().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Snapshot(Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, slot = %slot.name(), "Interaction slot unavailable");
                return Loaded::Unreachable;
            }
        };

        match serde_json::from_str::<Vec<Interaction>>(&raw) {
            // An id of u64::MAX leaves no room for the next one
            Ok(interactions) if interactions.iter().any(|i| i.id.checked_add(1).is_none()) => {
                tracing::warn!(
                    slot = %slot.name(),
                    "Interaction slot holds an exhausted id, starting from an empty collection"
                );
                Loaded::Snapshot(Vec::new())
            }
            Ok(interactions) => Loaded::Snapshot(interactions),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    slot = %slot.name(),
                    "Interaction slot corrupt, starting from an empty collection"
                );
                Loaded::Snapshot(Vec::new())
            }
        }
    }

    /// Refreshes `state` from the slot. When the slot cannot be reached the
    /// current in-memory view is kept.
    async fn reload(&self, state: &mut StoreState) {
        if let Loaded::Snapshot(interactions) = Self::read_slot(self.slot.as_ref()).await {
            state.replace(interactions);
        }
    }

    /// Best-effort write of the whole collection
    async fn persist(&self, state: &StoreState) {
        let snapshot = match serde_json::to_string(&state.interactions) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Interaction snapshot serialization failed");
                return;
            }
        };

        if let Err(e) = self.slot.write(snapshot).await {
            tracing::error!(
                error = %e,
                slot = %self.slot.name(),
                "Failed to persist interactions; keeping in-memory copy"
            );
        }
    }

    /// Find-or-insert for (movie, kind, user)
    ///
    /// Returns the existing interaction unchanged when the slot is taken.
    pub async fn create(
        &self,
        movie_id: i64,
        kind: InteractionKind,
        watched_date: Option<NaiveDate>,
        user_id: Option<String>,
    ) -> Interaction {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;

        if let Some(existing) = state
            .interactions
            .iter()
            .find(|i| i.is_same_slot(movie_id, kind, user_id.as_deref()))
        {
            return existing.clone();
        }

        let interaction = Interaction {
            id: state.next_id,
            movie_id,
            interaction_type: kind,
            watched_date,
            user_id,
            created_date: Utc::now(),
        };
        state.next_id = state.next_id.saturating_add(1);
        state.interactions.push(interaction.clone());
        self.persist(&state).await;

        tracing::info!(
            id = interaction.id,
            movie_id,
            kind = %kind,
            "Interaction created"
        );

        interaction
    }

    /// All interactions, in insertion order
    pub async fn list(&self) -> Vec<Interaction> {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;
        state.interactions.clone()
    }

    /// Interactions matching every field set in `criteria`
    pub async fn filter(&self, criteria: &InteractionFilter) -> Vec<Interaction> {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;
        state
            .interactions
            .iter()
            .filter(|i| criteria.matches(i))
            .cloned()
            .collect()
    }

    /// Interactions for one movie, scoped to `user_id` when given
    pub async fn get_by_movie(&self, movie_id: i64, user_id: Option<&str>) -> Vec<Interaction> {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;
        state
            .interactions
            .iter()
            .filter(|i| i.movie_id == movie_id)
            .filter(|i| user_id.map_or(true, |u| i.user_id.as_deref() == Some(u)))
            .cloned()
            .collect()
    }

    /// Hard-deletes an interaction. Returns false when the id is unknown.
    pub async fn remove(&self, id: u64) -> bool {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;

        let Some(index) = state.interactions.iter().position(|i| i.id == id) else {
            return false;
        };

        let removed = state.interactions.remove(index);
        self.persist(&state).await;

        tracing::info!(
            id,
            movie_id = removed.movie_id,
            kind = %removed.interaction_type,
            "Interaction removed"
        );

        true
    }
}
