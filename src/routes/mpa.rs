use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::Mpa;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Mpa>>> {
    let tiers = state.films.list_mpa().await?;
    Ok(Json(tiers))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Mpa>> {
    let mpa = state.films.get_mpa(id).await?;
    Ok(Json(mpa))
}
