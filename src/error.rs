use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::flash::Flash;
use crate::respond::{encode_query_value, see_other};

/// Application error taxonomy.
///
/// The first four variants are boundary conditions recovered into redirects
/// with a notice; `Database` and `Session` are genuine failures that surface
/// as a generic 500 after logging. Internal detail never reaches the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated { next: String },

    #[error("insufficient privileges")]
    Forbidden { back: String },

    #[error("{notice}")]
    NotFound { notice: String, back: String },

    /// Unique-constraint style conflicts, e.g. a second review for the same
    /// (book, user) pair.
    #[error("{notice}")]
    Conflict { notice: String, back: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(notice: impl Into<String>, back: impl Into<String>) -> Self {
        AppError::NotFound { notice: notice.into(), back: back.into() }
    }

    pub fn conflict(notice: impl Into<String>, back: impl Into<String>) -> Self {
        AppError::Conflict { notice: notice.into(), back: back.into() }
    }

    /// Structured log line emitted when a transactional operation fails.
    /// Only real store failures log at error level; recovered boundary
    /// conditions are debug noise.
    pub fn log(&self, op: &'static str) {
        match self {
            AppError::Database(err) => {
                tracing::error!(op, error = %err, "transaction rolled back")
            }
            other => tracing::debug!(op, error = %other, "operation aborted"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated { next } => {
                let target = format!("/auth?next={}", encode_query_value(&next));
                see_other(&target, Some(Flash::warning("Please log in to continue")))
            }
            AppError::Forbidden { back } => {
                see_other(&back, Some(Flash::warning("Insufficient privileges for this action")))
            }
            AppError::NotFound { notice, back } => see_other(&back, Some(Flash::danger(notice))),
            AppError::Conflict { notice, back } => see_other(&back, Some(Flash::warning(notice))),
            AppError::Database(err) => {
                tracing::error!(error = %err, "database failure");
                generic_500()
            }
            AppError::Session(err) => {
                tracing::error!(error = %err, "session token failure");
                generic_500()
            }
        }
    }
}

fn generic_500() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": true,
            "message": "An error occurred while processing your request",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn unauthenticated_redirects_to_login_with_return_target() {
        let response = AppError::Unauthenticated { next: "/add_review/7".into() }.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth?next=%2Fadd_review%2F7"
        );
    }

    #[test]
    fn forbidden_redirects_back_with_warning_notice() {
        let response = AppError::Forbidden { back: "/view_book/2".into() }.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/view_book/2");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("warning"));
    }

    #[test]
    fn database_errors_become_generic_500() {
        let response = AppError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
