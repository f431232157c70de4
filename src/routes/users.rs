use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::{User, UserDraft};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

impl From<CreateUserRequest> for UserDraft {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            email: request.email,
            login: request.login,
            name: request.name,
            birthday: request.birthday,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: i64,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.users.create_user(request.into()).await?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = User {
        id: request.id,
        email: request.email,
        login: request.login,
        name: request.name.unwrap_or_default(),
        birthday: request.birthday,
    };
    let user = state.users.update_user(user).await?;
    Ok(Json(user))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(user))
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users))
}

pub async fn add_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.users.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.users.remove_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn friends(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<User>>> {
    let friends = state.users.list_friends(id).await?;
    Ok(Json(friends))
}

pub async fn common_friends(
    State(state): State<AppState>,
    Path((id, other_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<User>>> {
    let friends = state.users.common_friends(id, other_id).await?;
    Ok(Json(friends))
}
