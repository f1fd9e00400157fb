use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::{AppError, AppResult};

/// Canonical catalog entry, as persisted by the movie repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    /// TMDB id; unique across the repository
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a movie. Fields arrive as loosely as the catalog and
/// the front end send them; `sanitize` turns them into a [`MovieDraft`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub trailer_url: Option<String>,
}

/// A movie that passed sanitization and is ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDraft {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub vote_average: Option<f64>,
    pub trailer_url: Option<String>,
}

impl NewMovie {
    /// Validates the catalog id and drops values the `movies` table would reject.
    ///
    /// Blank or malformed release dates, ratings outside `[0, 10]` and blank
    /// URLs are omitted rather than stored as sentinels.
    pub fn sanitize(self) -> AppResult<MovieDraft> {
        let tmdb_id = self
            .tmdb_id
            .filter(|id| *id > 0)
            .ok_or(AppError::MissingCatalogId)?;

        let release_date = self.release_date.as_deref().and_then(parse_release_date);
        let vote_average = self
            .vote_average
            .filter(|rating| rating.is_finite() && (0.0..=10.0).contains(rating));

        Ok(MovieDraft {
            tmdb_id,
            title: self.title,
            overview: self.overview,
            release_date,
            poster_url: non_blank(self.poster_url),
            backdrop_url: non_blank(self.backdrop_url),
            genres: self.genres,
            vote_average,
            trailer_url: non_blank(self.trailer_url),
        })
    }
}

impl MovieDraft {
    /// Materializes the draft with a repository-assigned id
    pub fn into_movie(self, id: i64, created_at: DateTime<Utc>) -> Movie {
        Movie {
            id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            overview: self.overview,
            release_date: self.release_date,
            poster_url: self.poster_url,
            backdrop_url: self.backdrop_url,
            genres: self.genres,
            vote_average: self.vote_average,
            trailer_url: self.trailer_url,
            created_at,
        }
    }
}

fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts a number, a numeric string, `""` or `null`
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Columns `list` may sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieSortField {
    #[default]
    CreatedAt,
    Title,
    VoteAverage,
}

impl MovieSortField {
    pub fn column(&self) -> &'static str {
        match self {
            MovieSortField::CreatedAt => "created_at",
            MovieSortField::Title => "title",
            MovieSortField::VoteAverage => "vote_average",
        }
    }

    /// Parses a caller-supplied sort field, falling back to `created_at`
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            None => Self::default(),
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(sort_by = %value, "Invalid sort field, using created_at");
                Self::default()
            }),
        }
    }
}

impl FromStr for MovieSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(MovieSortField::CreatedAt),
            "title" => Ok(MovieSortField::Title),
            "vote_average" => Ok(MovieSortField::VoteAverage),
            other => Err(AppError::InvalidInput(format!(
                "Unknown sort field: {}",
                other
            ))),
        }
    }
}

impl Display for MovieSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Equality-only, conjunctive movie criteria. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieFilter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl MovieFilter {
    pub fn by_tmdb_id(tmdb_id: i64) -> Self {
        Self {
            tmdb_id: Some(tmdb_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.tmdb_id.is_none()
            && self.title.is_none()
            && self.release_date.is_none()
            && self.vote_average.is_none()
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        self.id.map_or(true, |id| movie.id == id)
            && self.tmdb_id.map_or(true, |id| movie.tmdb_id == id)
            && self.title.as_ref().map_or(true, |t| &movie.title == t)
            && self
                .release_date
                .map_or(true, |d| movie.release_date == Some(d))
            && self
                .vote_average
                .map_or(true, |v| movie.vote_average == Some(v))
    }
}
