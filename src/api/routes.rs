use axum::{
    http::StatusCode,
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};
use crate::routes::{films, genres, mpa, users};

use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Films
        .route("/films", get(films::list).post(films::create).put(films::update))
        .route("/films/popular", get(films::popular))
        .route("/films/:id", get(films::get))
        .route("/films/:id/like/:user_id", put(films::like).delete(films::unlike))
        // Users and the friendship graph
        .route("/users", get(users::list).post(users::create).put(users::update))
        .route("/users/:id", get(users::get))
        .route("/users/:id/friends", get(users::friends))
        .route("/users/:id/friends/common/:other_id", get(users::common_friends))
        .route(
            "/users/:id/friends/:friend_id",
            put(users::add_friend).delete(users::remove_friend),
        )
        // Catalogs
        .route("/genres", get(genres::list))
        .route("/genres/:id", get(genres::get))
        .route("/mpa", get(mpa::list))
        .route("/mpa/:id", get(mpa::get))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}
