use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use sqlx::PgPool;

use crate::auth::session::token_from_headers;
use crate::auth::{Action, Policy};
use crate::database::models::User;
use crate::error::AppError;
use crate::state::AppState;

/// Resolved identity for routes that require a session.
///
/// Resolution happens on every request: the cookie token is verified, then
/// the full user row (role included) is re-read from the store. Rejection is
/// the `Unauthenticated` signal, which the error boundary turns into a
/// redirect to the login form carrying the original path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Optional identity for routes that render differently when logged in but
/// never require it. Invalid or absent tokens resolve to `None`; only a
/// store failure rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl CurrentUser {
    /// Authorization guard: checks the policy table before any handler work
    /// runs. On failure the caller is sent back where they came from with an
    /// insufficient-privileges notice.
    pub fn authorize(&self, policy: &Policy, action: Action, back: &str) -> Result<(), AppError> {
        if policy.allows(self.0.role(), action) {
            Ok(())
        } else {
            Err(AppError::Forbidden { back: back.to_string() })
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let unauthenticated = || AppError::Unauthenticated { next: next.clone() };

        let token = token_from_headers(&parts.headers).ok_or_else(unauthenticated)?;
        let user_id = state.sessions.verify(&token).ok_or_else(unauthenticated)?;
        let user = load_user(state.db.pool(), user_id)
            .await?
            .ok_or_else(unauthenticated)?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match token_from_headers(&parts.headers) {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };
        let user_id = match state.sessions.verify(&token) {
            Some(id) => id,
            None => return Ok(MaybeUser(None)),
        };
        Ok(MaybeUser(load_user(state.db.pool(), user_id).await?))
    }
}

async fn load_user(pool: &PgPool, user_id: i32) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, role_id, first_name, last_name FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Redirect target for guard failures: the referring page, falling back to
/// the catalog home.
pub fn backlink(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role_id: i32) -> CurrentUser {
        CurrentUser(User {
            id: 1,
            username: "nat".to_string(),
            role_id,
            first_name: None,
            last_name: None,
        })
    }

    #[test]
    fn guard_short_circuits_for_readers() {
        let policy = Policy::default();
        let reader = user(3);
        let err = reader.authorize(&policy, Action::CreateBook, "/somewhere").unwrap_err();
        match err {
            AppError::Forbidden { back } => assert_eq!(back, "/somewhere"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn guard_passes_admin_for_admin_actions() {
        let policy = Policy::default();
        assert!(user(1).authorize(&policy, Action::DeleteBook, "/").is_ok());
        assert!(user(2).authorize(&policy, Action::EditBook, "/").is_ok());
    }

    #[test]
    fn backlink_prefers_referer() {
        let mut headers = HeaderMap::new();
        assert_eq!(backlink(&headers), "/");
        headers.insert(header::REFERER, HeaderValue::from_static("/view_book/9"));
        assert_eq!(backlink(&headers), "/view_book/9");
    }
}
