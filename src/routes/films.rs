use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::{Film, FilmDraft};

use super::IdRef;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilmRequest {
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa: IdRef,
    #[serde(default)]
    pub genres: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilmRequest {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    pub mpa: IdRef,
    #[serde(default)]
    pub genres: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub count: Option<i64>,
}

impl From<CreateFilmRequest> for FilmDraft {
    fn from(request: CreateFilmRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            release_date: request.release_date,
            duration: request.duration,
            mpa_id: request.mpa.id,
            genre_ids: request.genres.into_iter().map(|g| g.id).collect(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateFilmRequest>,
) -> AppResult<Json<Film>> {
    let film = state.films.create_film(request.into()).await?;
    Ok(Json(film))
}

pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateFilmRequest>,
) -> AppResult<Json<Film>> {
    let draft = FilmDraft {
        name: request.name,
        description: request.description,
        release_date: request.release_date,
        duration: request.duration,
        mpa_id: request.mpa.id,
        genre_ids: request.genres.into_iter().map(|g| g.id).collect(),
    };
    let film = state.films.update_film(request.id, draft).await?;
    Ok(Json(film))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Film>> {
    let film = state.films.get_film(id).await?;
    Ok(Json(film))
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    let films = state.films.list_films().await?;
    Ok(Json(films))
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state.films.popular_films(params.count).await?;
    Ok(Json(films))
}

pub async fn like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.films.like_film(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn unlike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.films.unlike_film(id, user_id).await?;
    Ok(StatusCode::OK)
}
