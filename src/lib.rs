pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod respond;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full route table. Ordering contract per route: identity resolution, then
/// the authorization guard, then the transactional unit of work.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::books::list))
        .route("/auth", get(handlers::auth::login_form).post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .route("/profile", get(handlers::auth::profile))
        .route("/add_book", get(handlers::books::add_form).post(handlers::books::add))
        .route(
            "/edit_book/:book_id",
            get(handlers::books::edit_form).post(handlers::books::edit),
        )
        .route("/delete_book/:book_id", post(handlers::books::delete))
        .route("/view_book/:book_id", get(handlers::books::view))
        .route(
            "/add_review/:book_id",
            get(handlers::reviews::add_form).post(handlers::reviews::add),
        )
        .route(
            "/edit_review/:review_id",
            get(handlers::reviews::edit_form).post(handlers::reviews::edit),
        )
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": err.to_string(),
            })),
        ),
    }
}
