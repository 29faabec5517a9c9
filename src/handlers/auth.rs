// handlers/auth.rs - login, logout, profile

use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::auth::password;
use crate::database::models::Credential;
use crate::error::AppError;
use crate::flash::Flash;
use crate::middleware::CurrentUser;
use crate::respond::see_other_with_cookie;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox: present as "on" when ticked.
    pub remember_me: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /auth - login form descriptor (rendering is external)
pub async fn login_form() -> Json<serde_json::Value> {
    Json(json!({
        "form": "auth",
        "fields": ["username", "password", "remember_me"],
    }))
}

/// POST /auth - credential submission
///
/// Bad password and unknown username produce the identical generic notice so
/// the response never confirms whether an account exists.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let remember = form.remember_me.as_deref() == Some("on");
    let username = form.username.clone();

    let credential = state
        .db
        .run("login", move |tx| {
            Box::pin(async move {
                let credential: Option<Credential> = sqlx::query_as(
                    "SELECT id, password_hash FROM users WHERE username = $1",
                )
                .bind(&username)
                .fetch_optional(&mut **tx)
                .await?;
                Ok(credential)
            })
        })
        .await?;

    let salt = &state.config.session.secret;
    let user_id = match credential {
        Some(ref cred) if password::verify(salt, &form.password, &cred.password_hash) => cred.id,
        _ => {
            tracing::debug!(username = %form.username, "login rejected");
            return Ok(Json(json!({
                "ok": false,
                "notice": {
                    "level": "danger",
                    "message": "Unable to authenticate with the given username and password",
                },
            }))
            .into_response());
        }
    };

    let token = state.sessions.issue(user_id, remember)?;
    let cookie = state.sessions.cookie(&token, remember);
    let target = sanitize_next(query.next.as_deref());
    Ok(see_other_with_cookie(
        target,
        Some(Flash::success("Logged in successfully")),
        &cookie,
    ))
}

/// GET /logout - invalidate the session immediately
pub async fn logout(State(state): State<AppState>, _user: CurrentUser) -> Response {
    see_other_with_cookie(
        "/",
        Some(Flash::success("You have been logged out")),
        &state.sessions.clear_cookie(),
    )
}

/// GET /profile - placeholder
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({
        "username": user.username,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.role(),
    }))
}

/// Only same-site paths are honored as a post-login target.
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_target_must_be_a_local_path() {
        assert_eq!(sanitize_next(Some("/view_book/3")), "/view_book/3");
        assert_eq!(sanitize_next(Some("https://evil.example")), "/");
        assert_eq!(sanitize_next(Some("//evil.example")), "/");
        assert_eq!(sanitize_next(None), "/");
    }
}
