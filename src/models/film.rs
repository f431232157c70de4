use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Genre, Mpa};

/// A film with its rating label and genre set resolved against the catalogs.
///
/// This is the shape returned to callers; the stored row only carries the
/// rating-tier id (see [`FilmRecord`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Duration in minutes
    pub duration: i64,
    pub mpa: Mpa,
    /// Genres in the order they were attached to the film
    pub genres: Vec<Genre>,
}

/// Mutable film fields as supplied by a caller, referencing the catalogs by id
#[derive(Debug, Clone, PartialEq)]
pub struct FilmDraft {
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa_id: i32,
    pub genre_ids: Vec<i32>,
}

/// Film row as stored, with the rating tier referenced by id
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FilmRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa_id: i32,
}
