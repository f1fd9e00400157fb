use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// What the user did with a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Watched,
    Watchlist,
}

impl Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionKind::Watched => write!(f, "watched"),
            InteractionKind::Watchlist => write!(f, "watchlist"),
        }
    }
}

impl FromStr for InteractionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watched" => Ok(InteractionKind::Watched),
            "watchlist" => Ok(InteractionKind::Watchlist),
            other => Err(AppError::InvalidInput(format!(
                "Unknown interaction type: {}",
                other
            ))),
        }
    }
}

/// A user's recorded relationship to a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: u64,
    /// Repository id of the movie. Not checked against the repository.
    pub movie_id: i64,
    pub interaction_type: InteractionKind,
    #[serde(default)]
    pub watched_date: Option<NaiveDate>,
    /// Always `None` until multi-user support exists
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl Interaction {
    /// True when this record occupies the (movie, kind, user) slot
    pub fn is_same_slot(&self, movie_id: i64, kind: InteractionKind, user_id: Option<&str>) -> bool {
        self.movie_id == movie_id
            && self.interaction_type == kind
            && self.user_id.as_deref() == user_id
    }
}

/// Request body for creating an interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewInteraction {
    pub movie_id: i64,
    pub interaction_type: InteractionKind,
    #[serde(default)]
    pub watched_date: Option<NaiveDate>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Equality-only, conjunctive interaction criteria
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InteractionFilter {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub interaction_type: Option<InteractionKind>,
    #[serde(default)]
    pub watched_date: Option<NaiveDate>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl InteractionFilter {
    pub fn matches(&self, interaction: &Interaction) -> bool {
        self.id.map_or(true, |id| interaction.id == id)
            && self.movie_id.map_or(true, |id| interaction.movie_id == id)
            && self
                .interaction_type
                .map_or(true, |kind| interaction.interaction_type == kind)
            && self
                .watched_date
                .map_or(true, |d| interaction.watched_date == Some(d))
            && self
                .user_id
                .as_ref()
                .map_or(true, |u| interaction.user_id.as_ref() == Some(u))
    }
}
