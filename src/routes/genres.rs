use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::Genre;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.films.list_genres().await?;
    Ok(Json(genres))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Genre>> {
    let genre = state.films.get_genre(id).await?;
    Ok(Json(genre))
}
